use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;
use crate::handlers::common::{double_option, double_option_rfc3339};
use crate::middlewares::AuthUser;
use crate::models::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use crate::services::TaskService;
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: u64 = 20;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub project_id: i64,
    pub parent_task_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i32>,
    #[serde(default, deserialize_with = "double_option_rfc3339")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<Option<OffsetDateTime>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub parent_task_id: Option<Option<i64>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TaskListParams {
    pub project_id: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<TaskStatus>,
    /// Inclusive upper bound on due date (RFC 3339)
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[param(value_type = Option<String>)]
    pub due_before: Option<OffsetDateTime>,
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    #[param(default = 1, minimum = 1)]
    pub page: Option<u64>,
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<u64>,
    #[param(default = false)]
    pub include_deleted: Option<bool>,
}

impl TaskListParams {
    fn into_filter(self, max_limit: u64) -> TaskFilter {
        TaskFilter {
            project_id: self.project_id,
            status: self.status,
            due_before: self.due_before,
            search: self.search,
            page: self.page,
            limit: Some(self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(max_limit)),
            include_deleted: self.include_deleted.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: i64,
    pub user_id: i64,
    pub project_id: i64,
    pub parent_task_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: i32,
    #[schema(value_type = Option<String>)]
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[schema(value_type = Option<String>)]
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub depth: i32,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[schema(value_type = Option<String>)]
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            project_id: t.project_id,
            parent_task_id: t.parent_task_id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            due_date: t.due_date,
            completed_at: t.completed_at,
            depth: t.depth,
            created_at: t.created_at,
            updated_at: t.updated_at,
            deleted_at: t.deleted_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListResponse {
    pub data: Vec<TaskResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: Option<u64>,
    pub total_pages: u64,
}

// ============ Handlers ============

/// Create a task inside a project
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created successfully", body = TaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Project belongs to another user"),
        (status = 404, description = "Project not found"),
        (status = 422, description = "Parent task is missing or in another project")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn create_task(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    let create_task = CreateTask {
        user_id: user.id,
        project_id: payload.project_id,
        parent_task_id: payload.parent_task_id,
        title: payload.title,
        description: payload.description,
        priority: payload.priority,
        due_date: payload.due_date,
    };

    let task = TaskService::create_task(&state.deps, create_task).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

/// List the current user's tasks with filters and pagination
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskListParams),
    responses(
        (status = 200, description = "Filtered tasks", body = TaskListResponse),
        (status = 400, description = "Invalid page or limit"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn list_tasks(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> AppResult<Json<TaskListResponse>> {
    let filter = params.into_filter(state.config.max_page_limit);
    let page = TaskService::page_tasks(&state.deps, user.id, &filter).await?;

    Ok(Json(TaskListResponse {
        data: page.items.into_iter().map(|t| t.into()).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
    }))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = TaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn get_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TaskResponse>> {
    let task = TaskService::require_task(&state.deps, id, user.id).await?;
    Ok(Json(task.into()))
}

/// List direct subtasks
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/subtasks",
    params(
        ("id" = i64, Path, description = "Parent task ID")
    ),
    responses(
        (status = 200, description = "Subtasks", body = [TaskResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn list_subtasks(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    let tasks = TaskService::list_subtasks(&state.deps, id, user.id).await?;
    Ok(Json(tasks.into_iter().map(|t| t.into()).collect()))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = TaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found"),
        (status = 422, description = "Invalid parent task")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn update_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    let update_task = UpdateTask {
        title: payload.title,
        description: payload.description,
        status: payload.status,
        priority: payload.priority,
        due_date: payload.due_date,
        parent_task_id: payload.parent_task_id,
    };

    let task = TaskService::update_task(&state.deps, id, update_task, user.id).await?;
    Ok(Json(task.into()))
}

/// Mark a task completed
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/complete",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task completed", body = TaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task is already completed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn complete_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TaskResponse>> {
    let task = TaskService::complete_task(&state.deps, id, user.id).await?;
    Ok(Json(task.into()))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn delete_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    TaskService::delete_task(&state.deps, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
