/// First-start seeding
///
/// An empty users table gets one Admin so that at least one admin exists from the
/// moment the system is initialized. Seeding bypasses the access policy.

use crate::auth::password;
use crate::models::{NewUser, Role, User};
use crate::store::{ConflictKind, Repository, StoreError, StoreResult};

/// Creates the initial admin if no users exist yet
///
/// Returns the created user, or `None` when the table already had users. A
/// concurrent seed from another instance is treated as already seeded.
pub async fn seed_initial_admin(
    repo: &dyn Repository,
    email: &str,
    plaintext_password: &str,
) -> StoreResult<Option<User>> {
    if repo.count_users().await? > 0 {
        tracing::debug!("Users exist, skipping seed");
        return Ok(None);
    }

    password::validate_password(plaintext_password).map_err(StoreError::Validation)?;
    let password_hash = password::hash_password(plaintext_password)?;

    match repo
        .insert_user(NewUser {
            email: email.trim().to_string(),
            password_hash,
            role: Role::Admin,
        })
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, email = %user.email, "Seeded initial admin");
            Ok(Some(user))
        }
        Err(StoreError::Conflict(ConflictKind::EmailTaken)) => Ok(None),
        Err(e) => Err(e),
    }
}
