pub mod memory;
pub mod postgres;

pub use memory::{InMemoryProjectRepository, InMemoryTaskRepository, InMemoryUserRepository};
pub use postgres::{PgProjectRepository, PgTaskRepository, PgUserRepository};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::AppResult;
use crate::models::{
    NewProject, NewTask, NewUser, Project, ProjectCriteria, Task, TaskChanges, UpdateProject,
    UpdateUser, User,
};
use crate::query::TaskQuery;

// Repositories only persist. Ownership, hierarchy and status rules live in
// `services`. Unless stated otherwise, lookups skip soft-deleted rows.

/// Persistence contract for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a live user by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find a live user by email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user, or restore the soft-deleted row holding the same email.
    ///
    /// Returns `None` when a live row already owns the email.
    async fn upsert_restoring(&self, input: &NewUser) -> AppResult<Option<User>>;

    /// Update a live user; `None` if it does not exist
    async fn update(
        &self,
        id: i64,
        input: &UpdateUser,
        now: OffsetDateTime,
    ) -> AppResult<Option<User>>;

    /// Soft delete; `false` if no live row was affected
    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool>;
}

/// Persistence contract for projects
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// List projects matching the criteria, oldest first
    async fn find(&self, criteria: &ProjectCriteria) -> AppResult<Vec<Project>>;

    /// Find a live project by ID regardless of owner
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Project>>;

    /// Live direct children of a project, oldest first
    async fn find_children(&self, parent_id: i64) -> AppResult<Vec<Project>>;

    async fn create(&self, input: &NewProject) -> AppResult<Project>;

    /// Persist the fields present in `input`; `None` if no live row matched
    async fn update(
        &self,
        id: i64,
        input: &UpdateProject,
        now: OffsetDateTime,
    ) -> AppResult<Option<Project>>;

    /// Soft delete; `false` if no live row was affected
    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool>;
}

/// Persistence contract for tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Rows matching the composed query, creation order, windowed if paged
    async fn find(&self, query: &TaskQuery) -> AppResult<Vec<Task>>;

    /// Number of rows matching the query predicate (window ignored)
    async fn count(&self, query: &TaskQuery) -> AppResult<u64>;

    /// Find a live task by ID regardless of owner
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>>;

    /// Live tasks of a project, creation order
    async fn find_by_project(&self, project_id: i64) -> AppResult<Vec<Task>>;

    /// Live direct subtasks, creation order
    async fn find_children(&self, parent_task_id: i64) -> AppResult<Vec<Task>>;

    async fn create(&self, input: &NewTask) -> AppResult<Task>;

    /// Persist the given changes; `None` if no live row matched
    async fn update(&self, id: i64, changes: &TaskChanges) -> AppResult<Option<Task>>;

    /// Soft delete; `false` if no live row was affected
    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool>;
}
