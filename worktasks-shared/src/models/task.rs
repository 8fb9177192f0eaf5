/// Task model
///
/// Tasks are the unit of work tracked by the system. Ownership is recorded by
/// explicit foreign keys (`created_by_id`, `assigned_to_id`); views that need the
/// assignee's email get it from an explicit join, see [`TaskView`].
///
/// # Status
///
/// ```text
/// Pending ⇄ InProgress ⇄ Done
/// ```
///
/// Every status may be set from every other status. New tasks always start as
/// `Pending`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'pending',
///     created_by_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_to_id UUID REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 4000;

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// All statuses in display order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Done => "Done",
        }
    }

    /// Status transitions are unrestricted, including reopening a finished task
    pub fn can_transition_to(&self, _target: TaskStatus) -> bool {
        true
    }
}

/// Stored task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    pub title: String,

    pub description: String,

    pub status: TaskStatus,

    /// Author of the task, fixed at creation
    pub created_by_id: Uuid,

    /// Optional assignee
    pub assigned_to_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful mutation
    pub updated_at: DateTime<Utc>,
}

/// Task as returned to clients, with the assignee's email joined in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub task: Task,

    /// Email of the assignee, when assigned
    pub assigned_to_email: Option<String>,
}

/// Client-supplied input for creating a task
///
/// Authorship and status are not part of the draft: the creator is always the
/// acting user and every task starts `Pending`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Requested assignee, honored only for roles allowed to assign
    #[serde(default)]
    pub assigned_to_id: Option<Uuid>,
}

/// Fully-resolved task ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_by_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
}

/// Partial update
///
/// Only fields that are present are applied. For `assigned_to_id`, an absent key
/// leaves the assignee untouched while an explicit `null` (`Some(None)`) clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub assigned_to_id: Option<Option<Uuid>>,
}

/// Maps a present key (including `null`) to `Some`, so absence stays `None`
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// Keeps only the status field
    pub fn status_only(&self) -> TaskPatch {
        TaskPatch {
            status: self.status,
            ..Default::default()
        }
    }

    /// Applies the present fields to `task` and stamps `updated_at`
    pub fn apply_to(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignee) = self.assigned_to_id {
            task.assigned_to_id = assignee;
        }
        task.updated_at = now;
    }
}
