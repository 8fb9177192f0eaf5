use std::sync::Arc;

use uuid::Uuid;

use super::{Repository, StoreError, StoreResult, TaskFilter};
use crate::auth::actor::Actor;
use crate::auth::policy;
use crate::models::task::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
use crate::models::{NewTask, Page, PageRequest, Task, TaskDraft, TaskPatch, TaskStatus, TaskView};

/// Task operations under the access policy
///
/// Every method takes the acting [`Actor`] explicitly. Absent tasks are reported
/// as `NotFound` before any policy check so that a denial is always distinct from
/// a missing task.
#[derive(Clone)]
pub struct TaskStore {
    repo: Arc<dyn Repository>,
}

impl TaskStore {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Lists the tasks visible to `actor`, newest first
    ///
    /// `page` is 1-based. Out-of-range paging is a `Validation` error.
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<TaskStatus>,
        page: i64,
        page_size: i64,
    ) -> StoreResult<Page<TaskView>> {
        let request = PageRequest::new(page, page_size).map_err(StoreError::Validation)?;
        let filter = TaskFilter {
            visibility: policy::visibility(actor),
            status,
        };

        self.repo.page_tasks(&filter, request).await
    }

    /// Fetches one task if the actor may see it
    pub async fn get(&self, actor: &Actor, id: Uuid) -> StoreResult<TaskView> {
        let view = self
            .repo
            .find_task(id)
            .await?
            .ok_or(StoreError::NotFound("task"))?;

        if !policy::can_view(actor, &view.task) {
            tracing::debug!(actor_id = %actor.id, task_id = %id, "Task outside actor visibility");
            return Err(StoreError::forbidden("you cannot view this task"));
        }

        Ok(view)
    }

    /// Creates a task authored by `actor`
    ///
    /// The requested assignee is kept only when the actor's role allows assigning.
    pub async fn create(&self, actor: &Actor, draft: TaskDraft) -> StoreResult<TaskView> {
        validate_title(&draft.title)?;
        validate_description(&draft.description)?;

        let assigned_to_id = policy::authorize_create(actor, &draft);
        if draft.assigned_to_id.is_some() && assigned_to_id.is_none() {
            tracing::debug!(actor_id = %actor.id, "Dropped assignee from member-created task");
        }

        let view = self
            .repo
            .insert_task(NewTask {
                title: draft.title,
                description: draft.description,
                status: TaskStatus::Pending,
                created_by_id: actor.id,
                assigned_to_id,
            })
            .await?;

        tracing::info!(
            task_id = %view.task.id,
            created_by = %actor.id,
            assigned_to = ?view.task.assigned_to_id,
            "Task created"
        );

        Ok(view)
    }

    /// Applies the part of `patch` the actor is allowed to change
    ///
    /// Field checks run on the restricted patch only, so fields the actor may not
    /// write are dropped without being validated.
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: TaskPatch) -> StoreResult<TaskView> {
        let acting = *actor;
        let guard = move |task: &Task| -> StoreResult<TaskPatch> {
            let decision = policy::authorize_update(&acting, task, &patch);
            let allowed = decision.restrict(&patch).ok_or_else(|| {
                tracing::debug!(actor_id = %acting.id, task_id = %task.id, "Task update denied");
                StoreError::forbidden("you cannot update this task")
            })?;
            validate_patch(&allowed)?;

            match allowed.status {
                Some(target) if !task.status.can_transition_to(target) => Err(StoreError::Validation(
                    format!("cannot move task from {} to {}", task.status.as_str(), target.as_str()),
                )),
                _ => Ok(allowed),
            }
        };

        let view = self
            .repo
            .update_task(id, &guard)
            .await?
            .ok_or(StoreError::NotFound("task"))?;

        tracing::info!(task_id = %id, actor_id = %actor.id, status = view.task.status.as_str(), "Task updated");

        Ok(view)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> StoreResult<()> {
        let acting = *actor;
        let guard = move |task: &Task| -> StoreResult<()> {
            if policy::authorize_delete(&acting, task) {
                Ok(())
            } else {
                tracing::debug!(actor_id = %acting.id, task_id = %task.id, "Task delete denied");
                Err(StoreError::forbidden("you cannot delete this task"))
            }
        };

        if !self.repo.delete_task(id, &guard).await? {
            return Err(StoreError::NotFound("task"));
        }

        tracing::info!(task_id = %id, actor_id = %actor.id, "Task deleted");
        Ok(())
    }
}

fn validate_title(title: &str) -> StoreResult<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(StoreError::Validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> StoreResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(StoreError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_patch(patch: &TaskPatch) -> StoreResult<()> {
    if let Some(ref title) = patch.title {
        validate_title(title)?;
    }
    if let Some(ref description) = patch.description {
        validate_description(description)?;
    }
    Ok(())
}
