/// In-process repository
///
/// All state sits behind one `tokio::sync::RwLock`. Every mutation, including the
/// guarded multi-step ones, runs under a single write guard, which makes each of
/// them atomic with respect to concurrent callers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ConflictKind, Repository, StoreError, StoreResult, TaskDeleteGuard, TaskFilter,
    TaskUpdateGuard, UserDeleteGuard,
};
use crate::models::{
    NewTask, NewUser, Page, PageRequest, Role, Task, TaskView, User, UserSummary,
};

#[derive(Debug, Clone)]
struct StoredTask {
    task: Task,
    /// Insertion order, used as the tie-break for equal `created_at`
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    tasks: HashMap<Uuid, StoredTask>,
    next_seq: u64,
}

impl State {
    fn view(&self, task: &Task) -> TaskView {
        let assigned_to_email = task
            .assigned_to_id
            .and_then(|id| self.users.get(&id))
            .map(|user| user.email.clone());

        TaskView {
            task: task.clone(),
            assigned_to_email,
        }
    }

    fn check_assignee(&self, assignee: Option<Uuid>) -> StoreResult<()> {
        match assignee {
            Some(id) if !self.users.contains_key(&id) => {
                Err(StoreError::Validation("assignee does not exist".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn admin_count(&self) -> i64 {
        self.users.values().filter(|u| u.role == Role::Admin).count() as i64
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(ConflictKind::EmailTaken));
        }

        let stored = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_user_summaries(&self) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        let mut users: Vec<&User> = state.users.values().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));

        Ok(users.into_iter().map(User::summary).collect())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.state.read().await.users.len() as i64)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&id) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid, guard: &UserDeleteGuard) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let admin_count = state.admin_count();
        let target = match state.users.get(&id) {
            Some(user) => user,
            None => return Ok(false),
        };

        guard(target, admin_count)?;

        if state.tasks.values().any(|t| t.task.assigned_to_id == Some(id)) {
            return Err(StoreError::Conflict(ConflictKind::AssignedTasks));
        }

        state.users.remove(&id);
        // Authored tasks go with their creator
        state.tasks.retain(|_, t| t.task.created_by_id != id);

        Ok(true)
    }

    async fn insert_task(&self, task: NewTask) -> StoreResult<TaskView> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&task.created_by_id) {
            return Err(StoreError::Validation("creator does not exist".to_string()));
        }
        state.check_assignee(task.assigned_to_id)?;

        let now = Utc::now();
        let stored = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            status: task.status,
            created_by_id: task.created_by_id,
            assigned_to_id: task.assigned_to_id,
            created_at: now,
            updated_at: now,
        };

        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.insert(
            stored.id,
            StoredTask {
                task: stored.clone(),
                seq,
            },
        );

        Ok(state.view(&stored))
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<TaskView>> {
        let state = self.state.read().await;
        Ok(state.tasks.get(&id).map(|t| state.view(&t.task)))
    }

    async fn update_task(&self, id: Uuid, guard: &TaskUpdateGuard) -> StoreResult<Option<TaskView>> {
        let mut state = self.state.write().await;

        let mut task = match state.tasks.get(&id) {
            Some(stored) => stored.task.clone(),
            None => return Ok(None),
        };

        let patch = guard(&task)?;
        if let Some(assignee) = patch.assigned_to_id {
            state.check_assignee(assignee)?;
        }

        patch.apply_to(&mut task, Utc::now());
        let view = state.view(&task);
        if let Some(stored) = state.tasks.get_mut(&id) {
            stored.task = task;
        }

        Ok(Some(view))
    }

    async fn delete_task(&self, id: Uuid, guard: &TaskDeleteGuard) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let task = match state.tasks.get(&id) {
            Some(stored) => &stored.task,
            None => return Ok(false),
        };
        guard(task)?;

        state.tasks.remove(&id);
        Ok(true)
    }

    async fn page_tasks(&self, filter: &TaskFilter, page: PageRequest) -> StoreResult<Page<TaskView>> {
        let state = self.state.read().await;

        let mut matching: Vec<&StoredTask> = state
            .tasks
            .values()
            .filter(|t| filter.matches(&t.task))
            .collect();
        matching.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        let total_count = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|t| state.view(&t.task))
            .collect();

        Ok(Page::new(items, total_count, page))
    }
}
