use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Task lifecycle status
///
/// `pending -> in_progress -> completed`, and any non-terminal state may move
/// to `cancelled`. Only the dedicated completion action guards its transition;
/// plain updates may write any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub project_id: i64,
    pub parent_task_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Higher is more important
    pub priority: i32,
    pub due_date: Option<OffsetDateTime>,
    /// Set iff `status == Completed`
    pub completed_at: Option<OffsetDateTime>,
    pub depth: i32,
    pub path: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

impl Task {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: i64,
    pub project_id: i64,
    pub parent_task_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub due_date: Option<OffsetDateTime>,
}

/// Row handed to the repository
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: i64,
    pub project_id: i64,
    pub parent_task_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: i32,
    pub due_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Partial update from a caller. Outer `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i32>,
    pub due_date: Option<Option<OffsetDateTime>>,
    pub parent_task_id: Option<Option<i64>>,
}

/// Column-level changes persisted by the repository
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i32>,
    pub due_date: Option<Option<OffsetDateTime>>,
    pub parent_task_id: Option<Option<i64>>,
    pub completed_at: Option<Option<OffsetDateTime>>,
    pub updated_at: OffsetDateTime,
}

impl TaskChanges {
    /// Changes that only bump `updated_at`
    pub fn touch(now: OffsetDateTime) -> Self {
        Self {
            title: None,
            description: None,
            status: None,
            priority: None,
            due_date: None,
            parent_task_id: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Apply the changes to an in-memory row
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(parent_task_id) = self.parent_task_id {
            task.parent_task_id = parent_task_id;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        task.updated_at = self.updated_at;
    }
}

/// Filters accepted by the per-user task listing
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub status: Option<TaskStatus>,
    /// Inclusive upper bound on `due_date`
    pub due_before: Option<OffsetDateTime>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    /// 1-based, only meaningful with `limit`
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub include_deleted: bool,
}

/// One page of a filtered task listing
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total: u64,
    pub page: u64,
    pub limit: Option<u64>,
    pub total_pages: u64,
}
