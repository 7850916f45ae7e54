//! Location Tracking Handlers
//!
//! Every endpoint resolves the calling Didi's profile first; the ping
//! log is append-only and the profile mirrors the latest coordinates.

use axum::{Json, extract::State};

use shared::Role;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{LocationPing, LocationPingRequest};
use crate::db::repository::{DidiProfileRepository, LocationPingRepository, parse_record_id_for};
use crate::utils::validation::validate_coordinates;
use crate::utils::{AppError, AppResult};

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

/// POST /api/didi/location/ping - record a GPS ping
pub async fn ping(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(req): Json<LocationPingRequest>,
) -> AppResult<Json<LocationPing>> {
    validate_coordinates(req.latitude, req.longitude)?;

    let profile_id = caller_profile_id(&state, &current_user).await?;
    let ping = LocationPingRepository::new(state.get_db())
        .record(&profile_id, req)
        .await?;
    Ok(Json(ping))
}

/// GET /api/didi/location/history - full ping log, newest first
pub async fn history(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<LocationPing>>> {
    let profile_id = caller_profile_id(&state, &current_user).await?;
    let pings = LocationPingRepository::new(state.get_db())
        .history(&profile_id)
        .await?;
    Ok(Json(pings))
}

/// GET /api/didi/location/last - most recent ping (404 when none)
pub async fn last(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<LocationPing>> {
    let profile_id = caller_profile_id(&state, &current_user).await?;
    let ping = LocationPingRepository::new(state.get_db())
        .last(&profile_id)
        .await?;
    Ok(Json(ping))
}

/// GET /api/didi/location/today - pings since midnight
pub async fn today(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<LocationPing>>> {
    let profile_id = caller_profile_id(&state, &current_user).await?;
    let pings = LocationPingRepository::new(state.get_db())
        .today(&profile_id)
        .await?;
    Ok(Json(pings))
}
