/// Credential verification
///
/// Turns an email/password pair into an [`Actor`]. Unknown emails and wrong
/// passwords produce the same error so callers cannot probe for accounts.

use super::actor::Actor;
use super::password::{self, PasswordError};
use crate::store::{Repository, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Looks the user up by exact email and checks the password
///
/// Returns the actor together with the stored email, which goes into the token.
pub async fn verify_credential(
    repo: &dyn Repository,
    email: &str,
    plaintext_password: &str,
) -> Result<(Actor, String), IdentityError> {
    let user = match repo.find_user_by_email(email).await? {
        Some(user) => user,
        None => {
            tracing::debug!("Login attempt for unknown email");
            return Err(IdentityError::InvalidCredentials);
        }
    };

    if !password::verify_password(plaintext_password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(IdentityError::InvalidCredentials);
    }

    Ok((Actor::from(&user), user.email))
}
