//! User Account Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::client::{MessageResponse, UserInfo, UserUpdateRequest};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/v1/users/logged-in-user - the caller's own account
pub async fn logged_in_user(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserInfo>> {
    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_id(&current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", current_user.id)))?;
    Ok(Json(user.to_user_info()))
}

/// GET /api/v1/users/all - every account (admin)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<UserInfo>>> {
    let repo = UserRepository::new(state.get_db());
    let users = repo.find_all().await?;
    Ok(Json(users.iter().map(|u| u.to_user_info()).collect()))
}

/// PUT /api/v1/users/update/:id - partial account update
///
/// Non-admin callers may only update their own account.
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UserUpdateRequest>,
) -> AppResult<Json<UserInfo>> {
    if !current_user.is_admin() && current_user.id != id {
        return Err(AppError::forbidden("Cannot update another user's account"));
    }

    let repo = UserRepository::new(state.get_db());
    let user = repo.update(&id, req).await?;
    Ok(Json(user.to_user_info()))
}

/// DELETE /api/v1/users - delete the caller's own account
pub async fn delete_self(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    let repo = UserRepository::new(state.get_db());
    repo.delete(&current_user.id).await?;

    tracing::info!(user_id = %current_user.id, "User deleted their account");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// DELETE /api/v1/users/:id - delete any account (admin)
pub async fn delete_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let repo = UserRepository::new(state.get_db());
    repo.delete(&id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
