use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{UpdateUser, UserResponse};
use crate::services::UserService;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
}

// ============ Handlers ============

/// Get the current user (created on first authentication)
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn me(user: AuthUser, State(state): State<AppState>) -> AppResult<Json<UserResponse>> {
    let user = UserService::get_user(&state.deps, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(Json(user.into()))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let update_user = UpdateUser {
        display_name: payload.display_name,
    };

    let user = UserService::update_user(&state.deps, user.id, update_user).await?;
    Ok(Json(user.into()))
}

/// Soft delete the current user.
///
/// The bearer token stays valid until it expires, and the next request made
/// with it restores the same account. Discard the token to stay deleted.
#[utoipa::path(
    delete,
    path = "/api/users/me",
    responses(
        (status = 204, description = "User deleted; the next authenticated request restores it"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn delete_me(user: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    UserService::delete_user(&state.deps, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
