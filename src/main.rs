use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use tasknest::config::Config;
use tasknest::handlers::{
    CreateProjectRequest, CreateTaskRequest, ProjectListResponse, ProjectResponse,
    TaskListResponse, TaskResponse, UpdateProjectRequest, UpdateTaskRequest, UpdateUserRequest,
};
use tasknest::models::{TaskStatus, UserResponse};
use tasknest::state::AppState;
use tasknest::{build_router, handlers};

/// Security scheme for Bearer token
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::me,
        handlers::auth::update_me,
        handlers::auth::delete_me,
        handlers::project::create_project,
        handlers::project::list_projects,
        handlers::project::get_project,
        handlers::project::list_child_projects,
        handlers::project::list_project_tasks,
        handlers::project::update_project,
        handlers::project::delete_project,
        handlers::task::create_task,
        handlers::task::list_tasks,
        handlers::task::get_task,
        handlers::task::list_subtasks,
        handlers::task::update_task,
        handlers::task::complete_task,
        handlers::task::delete_task,
    ),
    components(schemas(
        UserResponse,
        UpdateUserRequest,
        CreateProjectRequest,
        ProjectListResponse,
        ProjectResponse,
        UpdateProjectRequest,
        CreateTaskRequest,
        TaskListResponse,
        TaskResponse,
        TaskStatus,
        UpdateTaskRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Current user endpoints"),
        (name = "Projects", description = "Project hierarchy endpoints"),
        (name = "Tasks", description = "Task management endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (LOG_FORMAT=json for structured output)
    let subscriber =
        tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // Load configuration
    let config = Config::from_env()?;
    let addr = config.server_addr();

    tracing::info!("Connecting to database...");
    let state = AppState::connect(config).await?;
    tracing::info!("Database connection established");

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
