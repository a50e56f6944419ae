pub mod auth;
pub mod common;
pub mod project;
pub mod task;

pub use auth::{delete_me, me, update_me, UpdateUserRequest};
pub use common::{double_option, double_option_rfc3339};
pub use project::{
    create_project, delete_project, get_project, list_child_projects, list_project_tasks,
    list_projects, update_project, CreateProjectRequest, ProjectListParams, ProjectListResponse,
    ProjectResponse, UpdateProjectRequest,
};
pub use task::{
    complete_task, create_task, delete_task, get_task, list_subtasks, list_tasks, update_task,
    CreateTaskRequest, TaskListParams, TaskListResponse, TaskResponse, UpdateTaskRequest,
};
