/// Task and user storage
///
/// Storage is split in two layers:
///
/// - [`Repository`]: data primitives over a backend. Multi-step mutations that must
///   be atomic take a guard closure that the backend runs against the locked row,
///   so authorization and the write happen inside one transaction.
/// - [`TaskStore`] / [`UserStore`]: the operations clients call. They consult
///   [`crate::auth::policy`] and translate its decisions into [`StoreError`]s.
///
/// # Backends
///
/// - [`postgres::PgRepository`]: production backend over `sqlx::PgPool`
/// - [`memory::MemoryRepository`]: in-process backend for tests and local runs

pub mod memory;
pub mod postgres;
mod tasks;
mod users;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;
pub use tasks::TaskStore;
pub use users::UserStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::password::PasswordError;
use crate::auth::policy::{UserDeleteDenial, Visibility};
use crate::models::{
    NewTask, NewUser, Page, PageRequest, Role, Task, TaskPatch, TaskStatus, TaskView, User,
    UserSummary,
};

/// Which constraint a conflicting write ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Another user already has this email
    EmailTaken,

    /// The user is still the assignee of at least one task
    AssignedTasks,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::EmailTaken => write!(f, "email is already registered"),
            ConflictKind::AssignedTasks => write!(f, "user is still assigned to tasks"),
        }
    }
}

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Policy denied the operation
    #[error("{0}")]
    Forbidden(String),

    /// Admin attempted a user deletion the safety rules refuse
    #[error("{0}")]
    Rejected(UserDeleteDenial),

    #[error("{0}")]
    Conflict(ConflictKind),

    /// Request is malformed or names something that does not exist
    #[error("{0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        StoreError::Forbidden(message.into())
    }

    /// Failures that are not the caller's fault
    pub fn is_internal(&self) -> bool {
        matches!(self, StoreError::Password(_) | StoreError::Database(_))
    }
}

impl From<UserDeleteDenial> for StoreError {
    fn from(denial: UserDeleteDenial) -> Self {
        match denial {
            UserDeleteDenial::NotAdmin => StoreError::Forbidden(denial.to_string()),
            UserDeleteDenial::SelfDelete | UserDeleteDenial::LastAdmin => {
                StoreError::Rejected(denial)
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Runs against the locked target user and the admin count read in the same transaction
pub type UserDeleteGuard = dyn Fn(&User, i64) -> StoreResult<()> + Send + Sync;

/// Runs against the locked task and returns the patch that may be applied
pub type TaskUpdateGuard = dyn Fn(&Task) -> StoreResult<TaskPatch> + Send + Sync;

/// Runs against the locked task before it is removed
pub type TaskDeleteGuard = dyn Fn(&Task) -> StoreResult<()> + Send + Sync;

/// Filter for paged task queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    pub visibility: Visibility,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.visibility.permits(task) && self.status.map_or(true, |s| task.status == s)
    }
}

/// Data primitives shared by the task and user stores
///
/// Implementations must make `delete_user`, `update_task` and `delete_task` atomic
/// with respect to concurrent calls, and must enforce email uniqueness at the
/// storage level.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Checks the backend is reachable
    async fn health_check(&self) -> StoreResult<()>;

    /// Inserts a user, failing with `Conflict(EmailTaken)` on a duplicate email
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact-match lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list_user_summaries(&self) -> StoreResult<Vec<UserSummary>>;

    async fn count_users(&self) -> StoreResult<i64>;

    /// Returns `false` if the user does not exist
    async fn set_user_role(&self, id: Uuid, role: Role) -> StoreResult<bool>;

    /// Deletes a user after `guard` accepts it
    ///
    /// Returns `false` if the user does not exist. Fails with
    /// `Conflict(AssignedTasks)` while any task is assigned to the user.
    async fn delete_user(&self, id: Uuid, guard: &UserDeleteGuard) -> StoreResult<bool>;

    /// Inserts a task, failing with `Validation` if the assignee does not exist
    async fn insert_task(&self, task: NewTask) -> StoreResult<TaskView>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<TaskView>>;

    /// Applies the patch returned by `guard` and refreshes `updated_at`
    ///
    /// Returns `None` if the task does not exist.
    async fn update_task(&self, id: Uuid, guard: &TaskUpdateGuard) -> StoreResult<Option<TaskView>>;

    /// Returns `false` if the task does not exist
    async fn delete_task(&self, id: Uuid, guard: &TaskDeleteGuard) -> StoreResult<bool>;

    /// Newest first, with a stable tie-break for equal `created_at`
    async fn page_tasks(&self, filter: &TaskFilter, page: PageRequest) -> StoreResult<Page<TaskView>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_denials_map_to_distinct_errors() {
        assert!(matches!(
            StoreError::from(UserDeleteDenial::NotAdmin),
            StoreError::Forbidden(_)
        ));
        assert!(matches!(
            StoreError::from(UserDeleteDenial::SelfDelete),
            StoreError::Rejected(UserDeleteDenial::SelfDelete)
        ));
        assert!(matches!(
            StoreError::from(UserDeleteDenial::LastAdmin),
            StoreError::Rejected(UserDeleteDenial::LastAdmin)
        ));
    }

    #[test]
    fn test_internal_classification() {
        assert!(StoreError::Database(sqlx::Error::RowNotFound).is_internal());
        assert!(!StoreError::NotFound("task").is_internal());
        assert!(!StoreError::Conflict(ConflictKind::EmailTaken).is_internal());
    }
}
