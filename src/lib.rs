// Library crate for tasknest
// Exports modules for use by the server binary and tests

pub mod config;
pub mod deps;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod query;
pub mod repositories;
pub mod services;
pub mod state;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    complete_task, create_project, create_task, delete_me, delete_project, delete_task,
    get_project, get_task, list_child_projects, list_project_tasks, list_projects, list_subtasks,
    list_tasks, me, update_me, update_project, update_task,
};
use crate::middlewares::auth_middleware;
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        // User routes
        .route("/api/users/me", get(me).put(update_me).delete(delete_me))
        // Project routes
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/children", get(list_child_projects))
        .route("/api/projects/{id}/tasks", get(list_project_tasks))
        // Task routes
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/tasks/{id}/subtasks", get(list_subtasks))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(|| async { "Hello, tasknest!" }))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
