use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};
use crate::handlers::common::double_option;
use crate::handlers::task::TaskResponse;
use crate::middlewares::AuthUser;
use crate::models::{CreateProject, ParentScope, Project, UpdateProject};
use crate::services::{ProjectService, TaskService};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub parent_project_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    /// `null` moves the project to the root
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub parent_project_id: Option<Option<i64>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProjectListParams {
    /// `root` for top-level projects or a parent project ID
    pub parent: Option<String>,
}

impl ProjectListParams {
    fn scope(&self) -> AppResult<ParentScope> {
        match self.parent.as_deref() {
            None => Ok(ParentScope::Any),
            Some("root") => Ok(ParentScope::Root),
            Some(raw) => raw
                .parse()
                .map(ParentScope::Children)
                .map_err(|_| AppError::Validation("parent must be `root` or an ID".to_string())),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i64,
    pub user_id: i64,
    pub parent_project_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub depth: i32,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    #[schema(value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            parent_project_id: p.parent_project_id,
            name: p.name,
            description: p.description,
            color: p.color,
            depth: p.depth,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<ProjectResponse>,
    pub total: u64,
}

impl From<Vec<Project>> for ProjectListResponse {
    fn from(projects: Vec<Project>) -> Self {
        Self {
            total: projects.len() as u64,
            data: projects.into_iter().map(|p| p.into()).collect(),
        }
    }
}

// ============ Handlers ============

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created successfully", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Parent project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn create_project(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    let create_project = CreateProject {
        user_id: user.id,
        parent_project_id: payload.parent_project_id,
        name: payload.name,
        description: payload.description,
        color: payload.color,
    };

    let project = ProjectService::create_project(&state.deps, create_project).await?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// List projects for the current user
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectListParams),
    responses(
        (status = 200, description = "List of projects", body = ProjectListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_projects(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ProjectListParams>,
) -> AppResult<Json<ProjectListResponse>> {
    let projects = ProjectService::list_projects(&state.deps, user.id, params.scope()?).await?;
    Ok(Json(projects.into()))
}

/// Get a project by ID
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn get_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProjectResponse>> {
    let project = ProjectService::require_project(&state.deps, id, user.id).await?;
    Ok(Json(project.into()))
}

/// List direct child projects
#[utoipa::path(
    get,
    path = "/api/projects/{id}/children",
    params(
        ("id" = i64, Path, description = "Parent project ID")
    ),
    responses(
        (status = 200, description = "Child projects", body = ProjectListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_child_projects(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProjectListResponse>> {
    let children = ProjectService::list_child_projects(&state.deps, id, user.id).await?;
    Ok(Json(children.into()))
}

/// List the live tasks of a project
#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project tasks", body = [TaskResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_project_tasks(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    let project = ProjectService::require_project(&state.deps, id, user.id).await?;
    let tasks = TaskService::list_tasks_by_project(&state.deps, project.id).await?;
    Ok(Json(tasks.into_iter().map(|t| t.into()).collect()))
}

/// Update a project
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
        (status = 422, description = "Project cannot be its own parent")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn update_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let update_project = UpdateProject {
        name: payload.name,
        description: payload.description,
        color: payload.color,
        parent_project_id: payload.parent_project_id,
    };

    let project = ProjectService::update_project(&state.deps, id, update_project, user.id).await?;
    Ok(Json(project.into()))
}

/// Delete a project
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Project still has child projects")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn delete_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    ProjectService::delete_project(&state.deps, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
