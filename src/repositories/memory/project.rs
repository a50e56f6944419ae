use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::models::{NewProject, ParentScope, Project, ProjectCriteria, UpdateProject};
use crate::repositories::memory::Table;
use crate::repositories::ProjectRepository;

/// In-memory project store
#[derive(Clone, Default)]
pub struct InMemoryProjectRepository {
    inner: Arc<Mutex<Table<Project>>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn oldest_first(mut projects: Vec<Project>) -> Vec<Project> {
    projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    projects
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn find(&self, criteria: &ProjectCriteria) -> AppResult<Vec<Project>> {
        let inner = self.inner.lock().await;
        let projects = inner
            .values()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect();
        Ok(oldest_first(projects))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Project>> {
        let inner = self.inner.lock().await;
        Ok(inner.get(id).filter(|p| !p.is_deleted()).cloned())
    }

    async fn find_children(&self, parent_id: i64) -> AppResult<Vec<Project>> {
        let criteria = ProjectCriteria::default().with_parent(ParentScope::Children(parent_id));
        self.find(&criteria).await
    }

    async fn create(&self, input: &NewProject) -> AppResult<Project> {
        let mut inner = self.inner.lock().await;
        let project = inner.insert_with(|id| Project {
            id,
            user_id: input.user_id,
            parent_project_id: input.parent_project_id,
            name: input.name.clone(),
            description: input.description.clone(),
            color: input.color.clone(),
            depth: 0,
            path: None,
            created_at: input.created_at,
            updated_at: input.created_at,
            deleted_at: None,
        });
        Ok(project.clone())
    }

    async fn update(
        &self,
        id: i64,
        input: &UpdateProject,
        now: OffsetDateTime,
    ) -> AppResult<Option<Project>> {
        let mut inner = self.inner.lock().await;
        let Some(project) = inner.get_mut(id).filter(|p| !p.is_deleted()) else {
            return Ok(None);
        };

        if let Some(name) = &input.name {
            project.name = name.clone();
        }
        if let Some(description) = &input.description {
            project.description = description.clone();
        }
        if let Some(color) = &input.color {
            project.color = color.clone();
        }
        if let Some(parent_project_id) = input.parent_project_id {
            project.parent_project_id = parent_project_id;
        }
        project.updated_at = now;
        Ok(Some(project.clone()))
    }

    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner.get_mut(id).filter(|p| !p.is_deleted()) {
            Some(project) => {
                project.deleted_at = Some(now);
                project.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
