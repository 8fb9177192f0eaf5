/// Authentication middleware for Axum
///
/// Reads `Authorization: Bearer <token>`, parses the session token and inserts the
/// resulting [`Actor`] into request extensions. Requests without a valid token are
/// rejected here, before any handler or policy runs.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::get, Extension, Router};
/// use worktasks_shared::auth::{actor::Actor, middleware::jwt_auth_middleware};
///
/// async fn whoami(Extension(actor): Extension<Actor>) -> String {
///     format!("{} ({})", actor.id, actor.role)
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(|req: Request, next: Next| {
///         jwt_auth_middleware("secret".to_string(), req, next)
///     }));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::actor::Actor;
use super::jwt::{parse_assertion, JwtError};

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    pub fn error_code(&self) -> &'static str {
        "unauthorized"
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Resolves the actor for a request from its headers
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Actor, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let actor = parse_assertion(token.trim(), secret)?;
    Ok(actor)
}

pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let actor = authenticate(req.headers(), &secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected unauthenticated request");
        e
    })?;

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
