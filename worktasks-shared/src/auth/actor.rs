/// The authenticated identity behind a request
///
/// An [`Actor`] is produced from a verified session token on every request and
/// passed explicitly into every policy and store call. It is never persisted and
/// never stored in ambient state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// ID of the authenticated user
    pub id: Uuid,

    /// Role carried by the session token
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}
