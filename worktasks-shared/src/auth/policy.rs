/// Authorization policy
///
/// Pure decision functions over `(Actor, Task | User, request)`. Nothing here
/// performs I/O or returns an error: expected denials are ordinary return values
/// that the stores translate into [`crate::store::StoreError`] variants.
///
/// # Permission Model
///
/// | Operation         | Admin | Manager | Member                                 |
/// |-------------------|-------|---------|----------------------------------------|
/// | see task          | all   | all     | created or assigned                    |
/// | assign on create  | yes   | yes     | silently dropped                       |
/// | update task       | full  | full    | full if creator, status-only if assignee |
/// | delete task       | all   | own     | own                                    |
/// | list users        | yes   | yes     | no                                     |
/// | create user       | yes   | no      | no                                     |
/// | change role       | yes   | no      | no                                     |
/// | delete user       | yes, except self and the last admin | no | no             |
///
/// Managers may edit any task but only delete tasks they created.

use uuid::Uuid;

use super::actor::Actor;
use crate::models::{Role, Task, TaskDraft, TaskPatch, User};

/// Which tasks an actor can see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every task
    All,

    /// Tasks created by or assigned to this user
    OwnedOrAssigned(Uuid),
}

impl Visibility {
    /// Evaluates the predicate against a single task
    pub fn permits(&self, task: &Task) -> bool {
        match self {
            Visibility::All => true,
            Visibility::OwnedOrAssigned(user_id) => {
                task.created_by_id == *user_id || task.assigned_to_id == Some(*user_id)
            }
        }
    }

    /// User ID the visible set is restricted to, if any
    pub fn restricted_to(&self) -> Option<Uuid> {
        match self {
            Visibility::All => None,
            Visibility::OwnedOrAssigned(user_id) => Some(*user_id),
        }
    }
}

/// Outcome of an update authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Apply every field present in the patch
    FullUpdate,

    /// Apply only the status field, ignore everything else
    StatusOnlyUpdate,

    Denied,
}

impl UpdateDecision {
    /// The subset of `patch` this decision allows, or `None` when denied
    pub fn restrict(&self, patch: &TaskPatch) -> Option<TaskPatch> {
        match self {
            UpdateDecision::FullUpdate => Some(patch.clone()),
            UpdateDecision::StatusOnlyUpdate => Some(patch.status_only()),
            UpdateDecision::Denied => None,
        }
    }
}

/// Why a user deletion was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserDeleteDenial {
    /// Only admins administer accounts
    #[error("only admins may delete users")]
    NotAdmin,

    /// An actor may not delete their own account
    #[error("you cannot delete your own account")]
    SelfDelete,

    /// Deleting this user would leave no admin
    #[error("cannot delete the last admin")]
    LastAdmin,
}

/// Outcome of a user deletion authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDeleteDecision {
    Allowed,
    Denied(UserDeleteDenial),
}

/// Visibility predicate for task listing
pub fn visibility(actor: &Actor) -> Visibility {
    match actor.role {
        Role::Admin | Role::Manager => Visibility::All,
        Role::Member => Visibility::OwnedOrAssigned(actor.id),
    }
}

/// Whether the actor may read a single task
pub fn can_view(actor: &Actor, task: &Task) -> bool {
    visibility(actor).permits(task)
}

/// Assignee the created task will carry
///
/// Any authenticated actor may create a task. The requested assignee survives only
/// for Admin and Manager; for a Member it is dropped, never rejected.
pub fn authorize_create(actor: &Actor, draft: &TaskDraft) -> Option<Uuid> {
    match actor.role {
        Role::Admin | Role::Manager => draft.assigned_to_id,
        Role::Member => None,
    }
}

/// Decides how much of `patch` the actor may apply to `task`
///
/// A Member who created the task keeps full edit rights even after it has been
/// assigned to someone else. An assignee who is not the creator gets a
/// status-only update, and only when the patch actually carries a status.
pub fn authorize_update(actor: &Actor, task: &Task, patch: &TaskPatch) -> UpdateDecision {
    match actor.role {
        Role::Admin | Role::Manager => UpdateDecision::FullUpdate,
        Role::Member => {
            if task.created_by_id == actor.id {
                UpdateDecision::FullUpdate
            } else if task.assigned_to_id == Some(actor.id) && patch.status.is_some() {
                UpdateDecision::StatusOnlyUpdate
            } else {
                UpdateDecision::Denied
            }
        }
    }
}

/// Admins delete anything; everyone else only what they created
pub fn authorize_delete(actor: &Actor, task: &Task) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Manager | Role::Member => task.created_by_id == actor.id,
    }
}

pub fn authorize_role_change(actor: &Actor) -> bool {
    actor.role == Role::Admin
}

pub fn authorize_user_create(actor: &Actor) -> bool {
    actor.role == Role::Admin
}

pub fn can_list_users(actor: &Actor) -> bool {
    match actor.role {
        Role::Admin | Role::Manager => true,
        Role::Member => false,
    }
}

/// Decides whether `actor` may delete `target`
///
/// `admin_count` must be read in the same transaction as the delete itself.
pub fn authorize_user_delete(actor: &Actor, target: &User, admin_count: i64) -> UserDeleteDecision {
    if actor.role != Role::Admin {
        return UserDeleteDecision::Denied(UserDeleteDenial::NotAdmin);
    }
    if target.id == actor.id {
        return UserDeleteDecision::Denied(UserDeleteDenial::SelfDelete);
    }
    if target.role == Role::Admin && admin_count <= 1 {
        return UserDeleteDecision::Denied(UserDeleteDenial::LastAdmin);
    }
    UserDeleteDecision::Allowed
}
