use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::memory::Table;
use crate::repositories::UserRepository;

/// In-memory user store
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    inner: Arc<Mutex<Table<User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.get(id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.lock().await;
        let user = inner
            .values()
            .find(|u| u.email == email && !u.is_deleted())
            .cloned();
        Ok(user)
    }

    async fn upsert_restoring(&self, input: &NewUser) -> AppResult<Option<User>> {
        let mut inner = self.inner.lock().await;

        // The email key spans deleted rows, so at most one row can match
        if let Some(existing) = inner.values_mut().find(|u| u.email == input.email) {
            if !existing.is_deleted() {
                return Ok(None);
            }
            existing.display_name = input.display_name.clone();
            existing.updated_at = input.created_at;
            existing.deleted_at = None;
            return Ok(Some(existing.clone()));
        }

        let user = inner.insert_with(|id| User {
            id,
            email: input.email.clone(),
            display_name: input.display_name.clone(),
            created_at: input.created_at,
            updated_at: input.created_at,
            deleted_at: None,
        });
        Ok(Some(user.clone()))
    }

    async fn update(
        &self,
        id: i64,
        input: &UpdateUser,
        now: OffsetDateTime,
    ) -> AppResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.get_mut(id).filter(|u| !u.is_deleted()) else {
            return Ok(None);
        };

        if let Some(display_name) = &input.display_name {
            user.display_name = display_name.clone();
        }
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: i64, now: OffsetDateTime) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner.get_mut(id).filter(|u| !u.is_deleted()) {
            Some(user) => {
                user.deleted_at = Some(now);
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
