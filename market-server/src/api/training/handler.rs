//! Training Handlers
//!
//! Lesson catalog writes are admin-only; the progress flow belongs to
//! the calling Didi.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use shared::Role;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    Difficulty, TrainingContent, TrainingContentCreate, TrainingContentUpdate, TrainingProgress,
    TrainingProgressUpdate,
};
use crate::db::repository::{DidiProfileRepository, TrainingRepository, parse_record_id_for};
use crate::utils::{AppError, AppResult};

fn repo(state: &ServerState) -> TrainingRepository {
    TrainingRepository::new(state.get_db())
}

async fn caller_profile_id(
    state: &ServerState,
    current_user: &CurrentUser,
) -> AppResult<surrealdb::RecordId> {
    current_user.ensure_role(Role::ShgDidi)?;
    let user = parse_record_id_for("user", &current_user.id)?;
    let profile = DidiProfileRepository::new(state.get_db())
        .find_by_user(&user)
        .await?
        .ok_or_else(|| AppError::not_found("Didi profile"))?;
    profile
        .id
        .ok_or_else(|| AppError::internal("Profile row without id"))
}

// =============================================================================
// Lesson catalog
// =============================================================================

/// POST /api/training/content (admin)
pub async fn create_content(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(req): Json<TrainingContentCreate>,
) -> AppResult<Json<TrainingContent>> {
    current_user.ensure_admin()?;
    let content = repo(&state).create_content(req).await?;
    Ok(Json(content))
}

/// PUT /api/training/content/:id (admin)
pub async fn update_content(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<TrainingContentUpdate>,
) -> AppResult<Json<TrainingContent>> {
    current_user.ensure_admin()?;
    let content = repo(&state).update_content(&id, req).await?;
    Ok(Json(content))
}

/// DELETE /api/training/content/:id (admin)
pub async fn delete_content(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    current_user.ensure_admin()?;
    repo(&state).delete_content(&id).await?;
    Ok(Json(true))
}

/// GET /api/training/content/:id
pub async fn get_content(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<TrainingContent>> {
    let content = repo(&state)
        .find_content(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Training content {}", id)))?;
    Ok(Json(content))
}

/// GET /api/training/content - active lessons in sequence order
pub async fn list_content(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<TrainingContent>>> {
    let contents = repo(&state).find_active_content().await?;
    Ok(Json(contents))
}

/// GET /api/training/content/difficulty/:difficulty
pub async fn list_by_difficulty(
    State(state): State<ServerState>,
    Path(difficulty): Path<Difficulty>,
) -> AppResult<Json<Vec<TrainingContent>>> {
    let contents = repo(&state).find_content_by_difficulty(difficulty).await?;
    Ok(Json(contents))
}

// =============================================================================
// Per-Didi progress
// =============================================================================

/// POST /api/training/:content_id/start
pub async fn start(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(content_id): Path<String>,
) -> AppResult<Json<TrainingProgress>> {
    let profile = caller_profile_id(&state, &current_user).await?;
    let progress = repo(&state).start(&profile, &content_id).await?;
    Ok(Json(progress))
}

/// PUT /api/training/:content_id/progress
pub async fn update_progress(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(content_id): Path<String>,
    Json(req): Json<TrainingProgressUpdate>,
) -> AppResult<Json<TrainingProgress>> {
    let profile = caller_profile_id(&state, &current_user).await?;
    let progress = repo(&state)
        .update_progress(&profile, &content_id, req.progress_percentage)
        .await?;
    Ok(Json(progress))
}

/// POST /api/training/:content_id/complete
pub async fn complete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(content_id): Path<String>,
) -> AppResult<Json<TrainingProgress>> {
    let profile = caller_profile_id(&state, &current_user).await?;
    let progress = repo(&state).complete(&profile, &content_id).await?;
    Ok(Json(progress))
}

/// POST /api/training/:content_id/fail
pub async fn fail(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(content_id): Path<String>,
) -> AppResult<Json<TrainingProgress>> {
    let profile = caller_profile_id(&state, &current_user).await?;
    let progress = repo(&state).fail(&profile, &content_id).await?;
    Ok(Json(progress))
}

/// GET /api/training/my-progress
pub async fn my_progress(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<TrainingProgress>>> {
    let profile = caller_profile_id(&state, &current_user).await?;
    let rows = repo(&state).progress_for(&profile).await?;
    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub completion_percentage: i32,
}

/// GET /api/training/completion - overall ratio, recomputed on demand
pub async fn completion(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<CompletionResponse>> {
    let profile = caller_profile_id(&state, &current_user).await?;
    let completion_percentage = repo(&state).completion_percentage(&profile).await?;
    Ok(Json(CompletionResponse {
        completion_percentage,
    }))
}
