/// User administration endpoints
///
/// # Endpoints
///
/// - `GET /api/users` - `[{id, email, role}]`, Admin or Manager
/// - `POST /api/users` - Create a user, Admin only
/// - `PUT /api/users/:id/role` - Change a role, Admin only
/// - `DELETE /api/users/:id` - Delete a user, Admin only
///
/// # Delete errors
///
/// - `400 self_delete`: the caller targeted their own account
/// - `400 last_admin`: the target is the only remaining Admin
/// - `409 user_has_assigned_tasks`: tasks are still assigned to the target

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use worktasks_shared::{
    auth::actor::Actor,
    models::{Role, UserDraft, UserSummary},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.list_summaries(&actor).await?))
}

/// `POST /api/users`
///
/// Responds `200` with the new user's summary; never echoes the credential.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserSummary>> {
    let Json(req) = body?;
    req.validate()?;

    let user = state
        .users
        .create(
            &actor,
            UserDraft {
                email: req.email,
                password: req.password,
                role: req.role,
            },
        )
        .await?;

    Ok(Json(user.summary()))
}

pub async fn change_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = body?;
    state.users.change_role(&actor, id, req.role).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.users.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
