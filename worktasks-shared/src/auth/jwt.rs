/// Session tokens
///
/// Tokens are HS256 JWTs that carry the actor's ID and role. Because the role is
/// inside the signed payload it cannot be altered without the issuing secret.
///
/// # Claims
///
/// - `sub`: User ID
/// - `role`: Role at the time of login
/// - `email`: Login email, informational only
/// - `iss`: Always "worktasks"
/// - `iat` / `nbf` / `exp`: Unix timestamps
///
/// A role change takes effect at the user's next login; tokens already issued keep
/// the role they were signed with until they expire.
///
/// # Example
///
/// ```
/// use worktasks_shared::auth::actor::Actor;
/// use worktasks_shared::auth::jwt::{issue_assertion, parse_assertion};
/// use worktasks_shared::models::Role;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let actor = Actor::new(Uuid::new_v4(), Role::Manager);
///
/// let issued = issue_assertion(&actor, "manager@example.com", secret, Duration::minutes(60))?;
/// assert_eq!(parse_assertion(&issued.token, secret)?, actor);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::Actor;
use crate::models::Role;

/// Issuer written into and required from every token
pub const ISSUER: &str = "worktasks";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Bad signature, wrong algorithm, malformed payload
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,

    pub role: Role,

    pub email: String,

    pub iss: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,
}

impl Claims {
    pub fn new(actor: &Actor, email: &str, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: actor.id,
            role: actor.role,
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.sub, self.role)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// A freshly signed token together with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `exp` and `nbf`, then returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Signs a session token for `actor`
pub fn issue_assertion(
    actor: &Actor,
    email: &str,
    secret: &str,
    expires_in: Duration,
) -> Result<IssuedToken, JwtError> {
    let claims = Claims::new(actor, email, expires_in);
    let token = create_token(&claims, secret)?;

    Ok(IssuedToken {
        token,
        expires_at: claims.expires_at(),
    })
}

/// Recovers the actor from a session token
pub fn parse_assertion(token: &str, secret: &str) -> Result<Actor, JwtError> {
    validate_token(token, secret).map(|claims| claims.actor())
}
