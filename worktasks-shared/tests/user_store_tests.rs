/// User store behavior against the in-memory repository

use std::sync::Arc;

use worktasks_shared::auth::actor::Actor;
use worktasks_shared::auth::password::verify_password;
use worktasks_shared::auth::policy::UserDeleteDenial;
use worktasks_shared::models::{NewUser, Role, TaskDraft, TaskPatch, UserDraft};
use worktasks_shared::store::{
    ConflictKind, MemoryRepository, Repository, StoreError, TaskStore, UserStore,
};

const UNUSED_HASH: &str = "$argon2id$v=19$m=65536,t=3,p=4$unused";

fn stores() -> (Arc<dyn Repository>, UserStore, TaskStore) {
    let repo: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
    (repo.clone(), UserStore::new(repo.clone()), TaskStore::new(repo))
}

async fn add_user(repo: &Arc<dyn Repository>, email: &str, role: Role) -> Actor {
    let user = repo
        .insert_user(NewUser {
            email: email.to_string(),
            password_hash: UNUSED_HASH.to_string(),
            role,
        })
        .await
        .expect("Failed to insert user");
    Actor::from(&user)
}

fn user_draft(email: &str, role: Role) -> UserDraft {
    UserDraft {
        email: email.to_string(),
        password: "123456".to_string(),
        role,
    }
}

#[tokio::test]
async fn test_list_summaries_requires_admin_or_manager() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;
    let manager = add_user(&repo, "manager@example.com", Role::Manager).await;
    let member = add_user(&repo, "member@example.com", Role::Member).await;

    let listed = users.list_summaries(&admin).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().any(|u| u.id == member.id && u.role == Role::Member));

    assert_eq!(users.list_summaries(&manager).await.unwrap().len(), 3);

    let denied = users.list_summaries(&member).await;
    assert!(matches!(denied, Err(StoreError::Forbidden(_))));
}

#[tokio::test]
async fn test_admin_creates_user_with_hashed_password() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;

    let created = users
        .create(&admin, user_draft("new@example.com", Role::Manager))
        .await
        .unwrap();
    assert_eq!(created.email, "new@example.com");
    assert_eq!(created.role, Role::Manager);

    let stored = repo.find_user(created.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "123456");
    assert!(verify_password("123456", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_only_admin_creates_users() {
    let (repo, users, _) = stores();
    let manager = add_user(&repo, "manager@example.com", Role::Manager).await;

    let result = users
        .create(&manager, user_draft("new@example.com", Role::Member))
        .await;
    assert!(matches!(result, Err(StoreError::Forbidden(_))));
    assert_eq!(repo.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;

    let result = users
        .create(&admin, user_draft("admin@example.com", Role::Member))
        .await;
    assert!(matches!(
        result,
        Err(StoreError::Conflict(ConflictKind::EmailTaken))
    ));
}

#[tokio::test]
async fn test_short_password_is_validation_error() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;

    let draft = UserDraft {
        password: "12345".to_string(),
        ..user_draft("short@example.com", Role::Member)
    };
    let result = users.create(&admin, draft).await;
    assert!(matches!(result, Err(StoreError::Validation(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_email_has_one_winner() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let users = users.clone();
        handles.push(tokio::spawn(async move {
            users
                .create(&admin, user_draft("race@example.com", Role::Member))
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(StoreError::Conflict(ConflictKind::EmailTaken)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(repo.count_users().await.unwrap(), 2);
}

#[tokio::test]
async fn test_change_role() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;
    let manager = add_user(&repo, "manager@example.com", Role::Manager).await;
    let member = add_user(&repo, "member@example.com", Role::Member).await;

    users.change_role(&admin, member.id, Role::Manager).await.unwrap();
    let promoted = repo.find_user(member.id).await.unwrap().unwrap();
    assert_eq!(promoted.role, Role::Manager);

    let denied = users.change_role(&manager, member.id, Role::Admin).await;
    assert!(matches!(denied, Err(StoreError::Forbidden(_))));

    let missing = users
        .change_role(&admin, uuid::Uuid::new_v4(), Role::Member)
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;

    let result = users.delete(&admin, admin.id).await;
    assert!(matches!(
        result,
        Err(StoreError::Rejected(UserDeleteDenial::SelfDelete))
    ));
}

#[tokio::test]
async fn test_last_admin_cannot_be_deleted() {
    let (repo, users, _) = stores();
    let first = add_user(&repo, "first@example.com", Role::Admin).await;
    let second = add_user(&repo, "second@example.com", Role::Admin).await;

    // Second is demoted but still holds a token issued while it was Admin
    users.change_role(&first, second.id, Role::Member).await.unwrap();

    let result = users.delete(&second, first.id).await;
    assert!(matches!(
        result,
        Err(StoreError::Rejected(UserDeleteDenial::LastAdmin))
    ));
    assert!(repo.find_user(first.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_one_of_two_admins_can_be_deleted() {
    let (repo, users, _) = stores();
    let first = add_user(&repo, "first@example.com", Role::Admin).await;
    let second = add_user(&repo, "second@example.com", Role::Admin).await;

    users.delete(&first, second.id).await.unwrap();
    assert!(repo.find_user(second.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_non_admin_cannot_delete_users() {
    let (repo, users, _) = stores();
    add_user(&repo, "admin@example.com", Role::Admin).await;
    let manager = add_user(&repo, "manager@example.com", Role::Manager).await;
    let member = add_user(&repo, "member@example.com", Role::Member).await;

    let result = users.delete(&manager, member.id).await;
    assert!(matches!(result, Err(StoreError::Forbidden(_))));
}

#[tokio::test]
async fn test_delete_missing_user() {
    let (repo, users, _) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;

    let result = users.delete(&admin, uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admin_deletes_leave_one_admin() {
    for _ in 0..20 {
        let (repo, users, _) = stores();
        let first = add_user(&repo, "first@example.com", Role::Admin).await;
        let second = add_user(&repo, "second@example.com", Role::Admin).await;

        let a = {
            let users = users.clone();
            tokio::spawn(async move { users.delete(&first, second.id).await })
        };
        let b = {
            let users = users.clone();
            tokio::spawn(async move { users.delete(&second, first.id).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let deleted = results.iter().filter(|r| r.is_ok()).count();
        let refused = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Rejected(UserDeleteDenial::LastAdmin))))
            .count();

        assert_eq!(deleted, 1);
        assert_eq!(refused, 1);

        let admins = repo
            .list_user_summaries()
            .await
            .unwrap()
            .into_iter()
            .filter(|u| u.role == Role::Admin)
            .count();
        assert_eq!(admins, 1);
    }
}

#[tokio::test]
async fn test_assigned_user_cannot_be_deleted() {
    let (repo, users, tasks) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;
    let member = add_user(&repo, "member@example.com", Role::Member).await;

    let task = tasks
        .create(
            &admin,
            TaskDraft {
                title: "assigned".to_string(),
                description: String::new(),
                assigned_to_id: Some(member.id),
            },
        )
        .await
        .unwrap();

    let blocked = users.delete(&admin, member.id).await;
    assert!(matches!(
        blocked,
        Err(StoreError::Conflict(ConflictKind::AssignedTasks))
    ));

    let unassign = TaskPatch {
        assigned_to_id: Some(None),
        ..Default::default()
    };
    tasks.update(&admin, task.task.id, unassign).await.unwrap();

    users.delete(&admin, member.id).await.unwrap();
    assert!(repo.find_user(member.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleting_creator_removes_their_tasks() {
    let (repo, users, tasks) = stores();
    let admin = add_user(&repo, "admin@example.com", Role::Admin).await;
    let member = add_user(&repo, "member@example.com", Role::Member).await;

    let own = tasks
        .create(
            &member,
            TaskDraft {
                title: "mine".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    users.delete(&admin, member.id).await.unwrap();

    assert!(repo.find_task(own.task.id).await.unwrap().is_none());
}
