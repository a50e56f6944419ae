use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::models::{NewTask, Task, TaskChanges};
use crate::query::{creation_order, TaskQuery};
use crate::repositories::memory::Table;
use crate::repositories::TaskRepository;

/// In-memory task store
#[derive(Clone, Default)]
pub struct InMemoryTaskRepository {
    inner: Arc<Mutex<Table<Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn live_where(&self, pred: impl Fn(&Task) -> bool) -> Vec<Task> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<Task> = inner
            .values()
            .filter(|t| !t.is_deleted() && pred(t))
            .cloned()
            .collect();
        tasks.sort_by(creation_order);
        tasks
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find(&self, query: &TaskQuery) -> AppResult<Vec<Task>> {
        let inner = self.inner.lock().await;
        Ok(query.apply(inner.values()))
    }

    async fn count(&self, query: &TaskQuery) -> AppResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.values().filter(|t| query.matches(t)).count() as u64)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>> {
        let inner = self.inner.lock().await;
        Ok(inner.get(id).filter(|t| !t.is_deleted()).cloned())
    }

    async fn find_by_project(&self, project_id: i64) -> AppResult<Vec<Task>> {
        Ok(self.live_where(|t| t.project_id == project_id).await)
    }

    async fn find_children(&self, parent_task_id: i64) -> AppResult<Vec<Task>> {
        Ok(self
            .live_where(|t| t.parent_task_id == Some(parent_task_id))
            .await)
    }

    async fn create(&self, input: &NewTask) -> AppResult<Task> {
        let mut inner = self.inner.lock().await;
        let task = inner.insert_with(|id| Task {
            id,
            user_id: input.user_id,
            project_id: input.project_id,
            parent_task_id: input.parent_task_id,
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            completed_at: None,
            depth: 0,
            path: None,
            created_at: input.created_at,
            updated_at: input.created_at,
            deleted_at: None,
        });
        Ok(task.clone())
    }

    async fn update(&self, id: i64, changes: &TaskChanges) -> AppResult<Option<Task>> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.get_mut(id).filter(|t| !t.is_deleted()) else {
            return Ok(None);
        };

        changes.apply_to(task);
        Ok(Some(task.clone()))
    }

    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner.get_mut(id).filter(|t| !t.is_deleted()) {
            Some(task) => {
                task.deleted_at = Some(now);
                task.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
