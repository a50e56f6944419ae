use crate::deps::Deps;
use crate::error::{AppError, AppResult};
use crate::models::{CreateUser, NewUser, UpdateUser, User};

/// User use-cases
pub struct UserService;

impl UserService {
    /// Create a user, restoring a soft-deleted row with the same email.
    ///
    /// Fails with `Conflict` when a live user already holds the email.
    pub async fn create_user(deps: &Deps, input: CreateUser) -> AppResult<User> {
        validate_email(&input.email)?;
        if input.display_name.trim().is_empty() {
            return Err(AppError::Validation("Display name is required".to_string()));
        }

        let new_user = NewUser {
            email: input.email,
            display_name: input.display_name,
            created_at: deps.now(),
        };

        let user = deps
            .users
            .upsert_restoring(&new_user)
            .await?
            .ok_or_else(|| AppError::Conflict("Email".to_string()))?;

        tracing::info!(user_id = user.id, "user created or restored");
        Ok(user)
    }

    /// Resolve the live user behind an authenticated email, creating it on first sight
    pub async fn ensure_user(deps: &Deps, email: &str, display_name: &str) -> AppResult<User> {
        if let Some(user) = deps.users.find_by_email(email).await? {
            return Ok(user);
        }

        let input = CreateUser {
            email: email.to_string(),
            display_name: display_name.to_string(),
        };
        match Self::create_user(deps, input).await {
            // Lost a race with a concurrent first request
            Err(AppError::Conflict(_)) => deps
                .users
                .find_by_email(email)
                .await?
                .ok_or_else(|| AppError::Persistence("user vanished after conflict".to_string())),
            other => other,
        }
    }

    pub async fn get_user(deps: &Deps, id: i64) -> AppResult<Option<User>> {
        deps.users.find_by_id(id).await
    }

    pub async fn get_user_by_email(deps: &Deps, email: &str) -> AppResult<Option<User>> {
        deps.users.find_by_email(email).await
    }

    pub async fn update_user(deps: &Deps, id: i64, input: UpdateUser) -> AppResult<User> {
        if input
            .display_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(AppError::Validation("Display name is required".to_string()));
        }

        deps.users
            .update(id, &input, deps.now())
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn delete_user(deps: &Deps, id: i64) -> AppResult<()> {
        if !deps.users.soft_delete(id, deps.now()).await? {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(user_id = id, "user soft-deleted");
        Ok(())
    }
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("Email is invalid".to_string()))
    }
}
