/// User model
///
/// Users are the accounts that log in and act on tasks. Every user carries exactly
/// one [`Role`], which drives every decision in [`crate::auth::policy`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'manager', 'member');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// Email is an exact-match key: `a@x.com` and `A@x.com` are different accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RBAC roles
///
/// Closed set; policy code matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    /// Sees and edits everything, deletes any task, administers users
    Admin,

    /// Sees and edits every task, lists users
    Manager,

    /// Sees and edits own tasks, updates status of tasks assigned to them
    Member,
}

impl Role {
    /// Converts role to its display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Member => "Member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
///
/// `password_hash` is an Argon2id PHC string and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Login identifier, unique across all users
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Role used for every authorization decision
    pub role: Role,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Projects the user onto its public summary
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Input for persisting a new user
///
/// Holds the already-derived credential, never the plaintext password.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address (exact-match unique)
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Initial role
    pub role: Role,
}

/// Client-supplied input for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct UserDraft {
    /// Email address
    pub email: String,

    /// Plaintext password, hashed before it reaches storage
    pub password: String,

    /// Initial role
    pub role: Role,
}

/// Minimal user projection returned by the user listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}
