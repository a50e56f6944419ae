use time::OffsetDateTime;

use crate::deps::Deps;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateTask, NewTask, Task, TaskChanges, TaskFilter, TaskPage, TaskStatus, UpdateTask,
};
use crate::query::TaskQuery;

/// Task use-cases
pub struct TaskService;

impl TaskService {
    /// Live task by ID, any owner
    pub async fn get_task(deps: &Deps, id: i64) -> AppResult<Option<Task>> {
        deps.tasks.find_by_id(id).await
    }

    /// Live task owned by `user_id`, or `None`
    pub async fn get_owned_task(deps: &Deps, id: i64, user_id: i64) -> AppResult<Option<Task>> {
        let task = deps.tasks.find_by_id(id).await?;
        Ok(task.filter(|t| t.is_owned_by(user_id)))
    }

    /// Capability-checked lookup; foreign tasks report `NotFound` like missing ones
    pub async fn require_task(deps: &Deps, id: i64, user_id: i64) -> AppResult<Task> {
        Self::get_owned_task(deps, id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task".to_string()))
    }

    pub async fn list_tasks_by_project(deps: &Deps, project_id: i64) -> AppResult<Vec<Task>> {
        deps.tasks.find_by_project(project_id).await
    }

    /// Filtered listing; unbounded unless `filter.limit` is set
    pub async fn list_tasks_by_user(
        deps: &Deps,
        user_id: i64,
        filter: &TaskFilter,
    ) -> AppResult<Vec<Task>> {
        let query = TaskQuery::compose(user_id, filter)?;
        tracing::debug!(user_id, ?query, "listing tasks");
        deps.tasks.find(&query).await
    }

    /// Rows matching the filter, ignoring page and limit
    pub async fn count_tasks(deps: &Deps, user_id: i64, filter: &TaskFilter) -> AppResult<u64> {
        let query = TaskQuery::compose(user_id, filter)?;
        deps.tasks.count(&query.unbounded()).await
    }

    /// One page plus the totals callers need to render paging
    pub async fn page_tasks(deps: &Deps, user_id: i64, filter: &TaskFilter) -> AppResult<TaskPage> {
        let query = TaskQuery::compose(user_id, filter)?;
        let items = deps.tasks.find(&query).await?;
        let total = deps.tasks.count(&query.unbounded()).await?;

        let (page, limit, total_pages) = match query.window {
            Some(window) => (window.page, Some(window.limit), window.total_pages(total)),
            None => (1, None, u64::from(total > 0)),
        };

        Ok(TaskPage {
            items,
            total,
            page,
            limit,
            total_pages,
        })
    }

    /// Direct subtasks of a task the user owns
    pub async fn list_subtasks(deps: &Deps, task_id: i64, user_id: i64) -> AppResult<Vec<Task>> {
        Self::require_task(deps, task_id, user_id).await?;
        deps.tasks.find_children(task_id).await
    }

    pub async fn create_task(deps: &Deps, input: CreateTask) -> AppResult<Task> {
        validate_title(&input.title)?;

        let project = deps
            .projects
            .find_by_id(input.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

        if !project.is_owned_by(input.user_id) {
            tracing::warn!(
                user_id = input.user_id,
                project_id = project.id,
                "task creation under a foreign project"
            );
            return Err(AppError::Forbidden(
                "Project belongs to another user".to_string(),
            ));
        }

        if let Some(parent_id) = input.parent_task_id {
            Self::check_parent(deps, parent_id, input.project_id).await?;
        }

        let new_task = NewTask {
            user_id: input.user_id,
            project_id: input.project_id,
            parent_task_id: input.parent_task_id,
            title: input.title,
            description: input.description,
            status: TaskStatus::Pending,
            priority: input.priority.unwrap_or(0),
            due_date: input.due_date,
            created_at: deps.now(),
        };

        let task = deps.tasks.create(&new_task).await?;
        tracing::info!(task_id = task.id, project_id = task.project_id, "task created");
        Ok(task)
    }

    /// Partial update. Status may be rewritten freely; `completed_at`
    /// follows whether the resulting status is `completed`.
    pub async fn update_task(
        deps: &Deps,
        id: i64,
        input: UpdateTask,
        user_id: i64,
    ) -> AppResult<Task> {
        let task = Self::require_task(deps, id, user_id).await?;

        if let Some(title) = &input.title {
            validate_title(title)?;
        }

        if let Some(Some(parent_id)) = input.parent_task_id {
            if task.parent_task_id != Some(parent_id) {
                if parent_id == id {
                    return Err(AppError::InvalidHierarchy(
                        "A task cannot be its own parent".to_string(),
                    ));
                }
                Self::check_parent(deps, parent_id, task.project_id).await?;
            }
        }

        let now = deps.now();
        let completed_at = input
            .status
            .and_then(|status| completion_stamp(&task, status, now));

        let changes = TaskChanges {
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            parent_task_id: input.parent_task_id,
            completed_at,
            updated_at: now,
        };

        let updated = Self::persist(deps, id, &changes).await?;
        tracing::info!(task_id = id, status = %updated.status, "task updated");
        Ok(updated)
    }

    /// Mark a task completed; a second completion is rejected
    pub async fn complete_task(deps: &Deps, id: i64, user_id: i64) -> AppResult<Task> {
        let task = Self::require_task(deps, id, user_id).await?;

        if task.status == TaskStatus::Completed {
            return Err(AppError::PreconditionFailed(
                "Task is already completed".to_string(),
            ));
        }

        let now = deps.now();
        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            completed_at: Some(Some(now)),
            ..TaskChanges::touch(now)
        };

        let completed = Self::persist(deps, id, &changes).await?;
        tracing::info!(task_id = id, "task completed");
        Ok(completed)
    }

    /// Soft delete; subtasks do not block deletion
    pub async fn delete_task(deps: &Deps, id: i64, user_id: i64) -> AppResult<()> {
        Self::require_task(deps, id, user_id).await?;

        if !deps.tasks.soft_delete(id, deps.now()).await? {
            return Err(AppError::Persistence(
                "task delete affected no row".to_string(),
            ));
        }

        tracing::info!(task_id = id, "task soft-deleted");
        Ok(())
    }

    /// A parent task must be live and belong to the same project
    async fn check_parent(deps: &Deps, parent_id: i64, project_id: i64) -> AppResult<()> {
        match deps.tasks.find_by_id(parent_id).await? {
            Some(parent) if parent.project_id == project_id => Ok(()),
            Some(_) => {
                tracing::warn!(parent_id, project_id, "parent task is in another project");
                Err(AppError::InvalidHierarchy(
                    "Parent task belongs to a different project".to_string(),
                ))
            }
            None => Err(AppError::InvalidHierarchy(
                "Parent task does not exist".to_string(),
            )),
        }
    }

    async fn persist(deps: &Deps, id: i64, changes: &TaskChanges) -> AppResult<Task> {
        deps.tasks
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::Persistence("task update affected no row".to_string()))
    }
}

/// `completed_at` change implied by moving `task` to `status`, if any
fn completion_stamp(
    task: &Task,
    status: TaskStatus,
    now: OffsetDateTime,
) -> Option<Option<OffsetDateTime>> {
    match (task.status, status) {
        (TaskStatus::Completed, TaskStatus::Completed) => None,
        (_, TaskStatus::Completed) => Some(Some(now)),
        (TaskStatus::Completed, _) => Some(None),
        _ => None,
    }
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Task title is required".to_string()));
    }
    Ok(())
}
