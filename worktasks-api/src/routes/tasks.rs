/// Task endpoints
///
/// All routes require a bearer token; the acting user comes from the `Actor`
/// extension inserted by the authentication layer. Authorization happens in the
/// task store, so handlers only translate between HTTP and store calls.
///
/// # Endpoints
///
/// - `GET /api/tasks?status=&page=&pageSize=` - Paged list of visible tasks
/// - `POST /api/tasks` - Create a task, `201` with the created task
/// - `GET /api/tasks/:id` - Fetch one task
/// - `PUT /api/tasks/:id` - Partial update, `204`
/// - `DELETE /api/tasks/:id` - Delete, `204`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use worktasks_shared::{
    auth::actor::Actor,
    models::{task::deserialize_present, Page, TaskDraft, TaskPatch, TaskStatus, TaskView},
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<TaskStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 4000, message = "Description must be at most 4000 characters"))]
    pub description: String,

    /// Ignored unless the caller may assign tasks
    #[serde(default)]
    pub assigned_to_id: Option<Uuid>,
}

impl From<CreateTaskRequest> for TaskDraft {
    fn from(req: CreateTaskRequest) -> Self {
        TaskDraft {
            title: req.title,
            description: req.description,
            assigned_to_id: req.assigned_to_id,
        }
    }
}

/// Partial update body
///
/// `assignedToId: null` clears the assignee; leaving the key out keeps it.
/// Field limits are checked by the store once the writable fields are known.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub assigned_to_id: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskPatch {
            title: req.title,
            description: req.description,
            status: req.status,
            assigned_to_id: req.assigned_to_id,
        }
    }
}

/// `GET /api/tasks`
///
/// Newest first. `page` starts at 1; `pageSize` is capped at 100 and anything
/// outside range is a `422`.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Page<TaskView>>> {
    let Query(query) = query?;

    let page = state
        .tasks
        .list(
            &actor,
            query.status,
            query.page.unwrap_or(DEFAULT_PAGE),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(Json(page))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(state.tasks.get(&actor, id).await?))
}

/// `POST /api/tasks`
///
/// The creator is always the caller and the status always starts `Pending`.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let Json(req) = body?;
    req.validate()?;

    let view = state.tasks.create(&actor, req.into()).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// `PUT /api/tasks/:id`
///
/// A caller holding only status rights has every other field dropped silently.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = body?;

    state.tasks.update(&actor, id, req.into()).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.tasks.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
