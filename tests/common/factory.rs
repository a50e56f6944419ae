use std::sync::Arc;

use time::macros::datetime;

use tasknest::config::Config;
use tasknest::deps::{Deps, ManualClock};
use tasknest::models::{CreateProject, CreateTask, CreateUser, Project, Task, User};
use tasknest::services::{AuthService, ProjectService, TaskService, UserService};

/// In-memory deps whose clock only moves when the test says so
pub fn clocked_deps() -> (Deps, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(datetime!(2026-03-01 09:00 UTC)));
    let deps = Deps::in_memory().with_clock(clock.clone());
    (deps, clock)
}

/// Authentication info for tests
pub struct TestAuth {
    pub email: String,
    pub token: String,
}

impl TestAuth {
    pub fn new(email: &str, config: &Config) -> Self {
        let token = AuthService::generate_token(email, Some("Test User"), config).unwrap();
        Self {
            email: email.to_string(),
            token,
        }
    }

    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Factory for creating test data through the use-case layer
pub struct Factory<'a> {
    deps: &'a Deps,
}

impl<'a> Factory<'a> {
    pub fn new(deps: &'a Deps) -> Self {
        Self { deps }
    }

    pub async fn create_user(&self, email: &str) -> User {
        let input = CreateUser {
            email: email.to_string(),
            display_name: "Test User".to_string(),
        };

        UserService::create_user(self.deps, input).await.unwrap()
    }

    pub async fn create_project(&self, user_id: i64, name: &str) -> Project {
        self.create_child_project(user_id, name, None).await
    }

    pub async fn create_child_project(
        &self,
        user_id: i64,
        name: &str,
        parent_project_id: Option<i64>,
    ) -> Project {
        let input = CreateProject {
            user_id,
            parent_project_id,
            name: name.to_string(),
            description: None,
            color: None,
        };

        ProjectService::create_project(self.deps, input)
            .await
            .unwrap()
    }

    pub async fn create_task(&self, user_id: i64, project_id: i64, title: &str) -> Task {
        self.create_task_with(CreateTask {
            user_id,
            project_id,
            parent_task_id: None,
            title: title.to_string(),
            description: None,
            priority: None,
            due_date: None,
        })
        .await
    }

    pub async fn create_task_with(&self, input: CreateTask) -> Task {
        TaskService::create_task(self.deps, input).await.unwrap()
    }
}
