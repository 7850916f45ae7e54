//! Didi Onboarding Handlers
//!
//! Registration is a multipart request (JSON `data` field plus an
//! optional aadhaar image `file` field); the approval workflow is
//! admin-only.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};

use shared::Role;
use shared::client::MessageResponse;

use crate::api::upload::{delete_stored_file, store_image};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{ApprovalStatus, DidiApprovalRequest, DidiOnboardingRequest, DidiProfile};
use crate::db::repository::{DidiProfileRepository, parse_record_id_for};
use crate::utils::validation::{validate_aadhaar, validate_coordinates};
use crate::utils::{AppError, AppResult};

fn repo(state: &ServerState) -> DidiProfileRepository {
    DidiProfileRepository::new(state.get_db())
}

fn caller_id(user: &CurrentUser) -> AppResult<surrealdb::RecordId> {
    Ok(parse_record_id_for("user", &user.id)?)
}

/// Pull the JSON `data` field and optional aadhaar image out of a
/// multipart registration request
async fn read_registration(
    multipart: &mut Multipart,
) -> Result<(DidiOnboardingRequest, Option<(Vec<u8>, String)>), AppError> {
    let mut data: Option<DidiOnboardingRequest> = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("data") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Multipart error: {}", e)))?;
                data = Some(serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::validation(format!("Invalid 'data' field: {}", e))
                })?);
            }
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::validation("No filename provided in file field"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Multipart error: {}", e)))?;
                file = Some((bytes.to_vec(), original_name));
            }
            _ => {}
        }
    }

    Ok((data.unwrap_or_default(), file))
}

/// POST /api/didi/register - create the caller's Didi profile
pub async fn register(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<DidiProfile>> {
    current_user.ensure_role(Role::ShgDidi)?;
    let user = caller_id(&current_user)?;

    let (data, file) = read_registration(&mut multipart).await?;

    if let Some(aadhaar) = &data.aadhaar_number {
        validate_aadhaar(aadhaar)?;
    }
    if let (Some(lat), Some(lon)) = (data.latitude, data.longitude) {
        validate_coordinates(lat, lon)?;
    }

    let aadhaar_image_url = match file {
        Some((bytes, name)) => Some(store_image(&state, &bytes, &name)?),
        None => None,
    };

    let profile = repo(&state).register(&user, data, aadhaar_image_url).await?;
    Ok(Json(profile))
}

/// GET /api/didi/my-profile
pub async fn my_profile(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<DidiProfile>> {
    let user = caller_id(&current_user)?;
    let profile = repo(&state)
        .find_by_user(&user)
        .await?
        .ok_or_else(|| AppError::not_found("Didi profile"))?;
    Ok(Json(profile))
}

/// GET /api/didi/profile/:id (admin)
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DidiProfile>> {
    current_user.ensure_admin()?;
    let profile = repo(&state)
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Didi profile {}", id)))?;
    Ok(Json(profile))
}

/// PUT /api/didi/profile - owner partial update (multipart)
pub async fn update_profile(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<DidiProfile>> {
    let user = caller_id(&current_user)?;
    let (data, file) = read_registration(&mut multipart).await?;

    if let Some(aadhaar) = &data.aadhaar_number {
        validate_aadhaar(aadhaar)?;
    }
    if let (Some(lat), Some(lon)) = (data.latitude, data.longitude) {
        validate_coordinates(lat, lon)?;
    }

    let repo = repo(&state);
    let aadhaar_image_url = match file {
        Some((bytes, name)) => {
            // Replacing the image deletes the old file
            if let Some(existing) = repo.find_by_user(&user).await?
                && let Some(old) = &existing.aadhaar_image_url
            {
                delete_stored_file(&state, old);
            }
            Some(store_image(&state, &bytes, &name)?)
        }
        None => None,
    };

    let profile = repo.update_profile(&user, data, aadhaar_image_url).await?;
    Ok(Json(profile))
}

/// GET /api/didi/pending - profiles awaiting approval (admin)
pub async fn pending(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<DidiProfile>>> {
    current_user.ensure_admin()?;
    let profiles = repo(&state)
        .find_by_approval_status(ApprovalStatus::Pending)
        .await?;
    Ok(Json(profiles))
}

/// GET /api/didi/approved - all approved sellers
pub async fn approved(State(state): State<ServerState>) -> AppResult<Json<Vec<DidiProfile>>> {
    let profiles = repo(&state)
        .find_by_approval_status(ApprovalStatus::Approved)
        .await?;
    Ok(Json(profiles))
}

/// POST /api/didi/approve (admin)
pub async fn approve(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(req): Json<DidiApprovalRequest>,
) -> AppResult<Json<DidiProfile>> {
    current_user.ensure_admin()?;
    let profile = repo(&state).approve(&req.didi_profile_id).await?;
    Ok(Json(profile))
}

/// POST /api/didi/reject (admin)
pub async fn reject(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(req): Json<DidiApprovalRequest>,
) -> AppResult<Json<DidiProfile>> {
    current_user.ensure_admin()?;
    let profile = repo(&state)
        .reject(&req.didi_profile_id, req.rejection_reason)
        .await?;
    Ok(Json(profile))
}

#[derive(Debug, serde::Deserialize)]
pub struct SuspendRequest {
    pub reason: Option<String>,
}

/// POST /api/didi/:id/suspend (admin)
pub async fn suspend(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<SuspendRequest>,
) -> AppResult<Json<MessageResponse>> {
    current_user.ensure_admin()?;
    repo(&state).suspend(&id, req.reason).await?;
    Ok(Json(MessageResponse::new("Didi has been suspended")))
}

/// POST /api/didi/:id/reactivate (admin)
pub async fn reactivate(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    current_user.ensure_admin()?;
    repo(&state).reactivate(&id).await?;
    Ok(Json(MessageResponse::new("Didi has been reactivated")))
}
