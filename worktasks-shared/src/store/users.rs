use std::sync::Arc;

use uuid::Uuid;

use super::{Repository, StoreError, StoreResult};
use crate::auth::actor::Actor;
use crate::auth::password;
use crate::auth::policy::{self, UserDeleteDecision};
use crate::models::{NewUser, Role, User, UserDraft, UserSummary};

/// User administration under the access policy
#[derive(Clone)]
pub struct UserStore {
    repo: Arc<dyn Repository>,
}

impl UserStore {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn list_summaries(&self, actor: &Actor) -> StoreResult<Vec<UserSummary>> {
        if !policy::can_list_users(actor) {
            return Err(StoreError::forbidden("only admins and managers may list users"));
        }
        self.repo.list_user_summaries().await
    }

    /// Creates an account with a hashed credential
    ///
    /// A duplicate email fails with `Conflict(EmailTaken)` from the storage
    /// constraint, so concurrent creates resolve to exactly one winner.
    pub async fn create(&self, actor: &Actor, draft: UserDraft) -> StoreResult<User> {
        if !policy::authorize_user_create(actor) {
            return Err(StoreError::forbidden("only admins may create users"));
        }

        let email = draft.email.trim().to_string();
        if email.is_empty() {
            return Err(StoreError::Validation("email must not be empty".to_string()));
        }
        password::validate_password(&draft.password).map_err(StoreError::Validation)?;

        let password_hash = password::hash_password(&draft.password)?;
        let user = self
            .repo
            .insert_user(NewUser {
                email,
                password_hash,
                role: draft.role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, created_by = %actor.id, "User created");
        Ok(user)
    }

    /// Overwrites a user's role
    ///
    /// Tokens already issued to that user keep their old role until they expire.
    pub async fn change_role(&self, actor: &Actor, id: Uuid, role: Role) -> StoreResult<()> {
        if !policy::authorize_role_change(actor) {
            return Err(StoreError::forbidden("only admins may change roles"));
        }

        if !self.repo.set_user_role(id, role).await? {
            return Err(StoreError::NotFound("user"));
        }

        tracing::info!(user_id = %id, role = %role, changed_by = %actor.id, "User role changed");
        Ok(())
    }

    /// Hard-deletes a user subject to the self-delete and last-admin rules
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> StoreResult<()> {
        // Non-admins are refused before the target is even looked up
        if !actor.is_admin() {
            return Err(StoreError::forbidden("only admins may delete users"));
        }

        let acting = *actor;
        let guard = move |target: &User, admin_count: i64| {
            match policy::authorize_user_delete(&acting, target, admin_count) {
                UserDeleteDecision::Allowed => Ok(()),
                UserDeleteDecision::Denied(reason) => {
                    tracing::warn!(actor_id = %acting.id, target_id = %target.id, %reason, "User delete refused");
                    Err(StoreError::from(reason))
                }
            }
        };

        if !self.repo.delete_user(id, &guard).await? {
            return Err(StoreError::NotFound("user"));
        }

        tracing::info!(user_id = %id, deleted_by = %actor.id, "User deleted");
        Ok(())
    }
}
