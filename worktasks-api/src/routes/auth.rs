/// Authentication endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "admin@example.com", "password": "secret" }
/// ```
///
/// ```json
/// {
///   "token": "eyJ...",
///   "userId": "uuid",
///   "role": "Admin",
///   "expiresAt": "2025-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `401 Unauthorized`: Unknown email or wrong password, indistinguishably
/// - `422 Unprocessable Entity`: Validation failed

use crate::{app::AppState, error::ApiResult};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use worktasks_shared::{
    auth::{identity::verify_credential, jwt::issue_assertion},
    models::Role,
};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,

    pub user_id: Uuid,

    pub role: Role,

    pub expires_at: DateTime<Utc>,
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body?;
    req.validate()?;

    let (actor, email) = verify_credential(state.repo.as_ref(), &req.email, &req.password).await?;

    let issued = issue_assertion(&actor, &email, state.jwt_secret(), state.config.jwt.expiry())?;

    tracing::info!(user_id = %actor.id, role = %actor.role, "User logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        user_id: actor.id,
        role: actor.role,
        expires_at: issued.expires_at,
    }))
}
