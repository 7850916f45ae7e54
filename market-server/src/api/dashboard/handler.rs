//! Didi Dashboard Handlers
//!
//! Aggregated read over the profile, its assigned orders, training
//! progress and last location ping. Everything is recomputed per
//! request; nothing here is incrementally maintained.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{DidiProfile, OrderStatus};
use crate::db::repository::{
    DidiProfileRepository, LocationPingRepository, OrderRepository, TrainingRepository,
    UserRepository, parse_record_id_for,
};
use crate::utils::{AppError, AppResult};

/// One row of the recent-orders strip
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub amount: f64,
    pub customer_name: String,
}

/// Dashboard aggregate for one Didi
#[derive(Debug, Serialize)]
pub struct DidiDashboardResponse {
    pub didi_profile_id: String,
    pub didi_name: String,
    pub location: Option<String>,
    pub approval_status: crate::db::models::ApprovalStatus,
    pub training_status: crate::db::models::TrainingStatus,
    pub total_earnings: f64,
    pub average_rating: f64,
    pub assigned_orders: usize,
    pub pending_orders: usize,
    pub completed_orders: usize,
    pub cancelled_orders: usize,
    pub recent_orders: Vec<OrderSummary>,
    pub training_completion_percentage: i32,
    /// "yyyy-MM-dd HH:mm:ss" of the last ping, or "N/A"
    pub last_location_update: String,
}

/// GET /api/didi/dashboard - the calling Didi's dashboard
pub async fn my_dashboard(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<DidiDashboardResponse>> {
    let user = parse_record_id_for("user", &current_user.id)?;
    let profile = DidiProfileRepository::new(state.get_db())
        .find_by_user(&user)
        .await?
        .ok_or_else(|| AppError::not_found("Didi profile"))?;

    Ok(Json(build_dashboard(&state, profile).await?))
}

/// GET /api/didi/dashboard/:profile_id (admin)
pub async fn dashboard_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(profile_id): Path<String>,
) -> AppResult<Json<DidiDashboardResponse>> {
    current_user.ensure_admin()?;

    let profile = DidiProfileRepository::new(state.get_db())
        .find_by_id(&profile_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Didi profile {}", profile_id)))?;

    Ok(Json(build_dashboard(&state, profile).await?))
}

async fn build_dashboard(
    state: &ServerState,
    profile: DidiProfile,
) -> AppResult<DidiDashboardResponse> {
    let profile_id = profile
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Profile row without id"))?;

    let order_repo = OrderRepository::new(state.get_db());
    let user_repo = UserRepository::new(state.get_db());
    let training_repo = TrainingRepository::new(state.get_db());
    let ping_repo = LocationPingRepository::new(state.get_db());

    let assigned = order_repo.find_assigned_to_shg(&profile.user).await?;

    let pending = assigned
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count();
    let completed = assigned
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .count();
    let cancelled = assigned
        .iter()
        .filter(|o| o.status == OrderStatus::Cancelled)
        .count();

    let mut recent_orders = Vec::new();
    for order in assigned.iter().take(5) {
        let customer_name = user_repo
            .find_by_id(&order.user.to_string())
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| "Unknown".to_string());
        recent_orders.push(OrderSummary {
            order_id: order.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            order_number: order.order_number.clone(),
            status: order.status,
            amount: order.final_amount,
            customer_name,
        });
    }

    let training_completion_percentage =
        training_repo.completion_percentage(&profile_id).await?;

    let didi_name = user_repo
        .find_by_id(&profile.user.to_string())
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "Unknown".to_string());

    let last_location_update = match ping_repo.last(&profile_id).await {
        Ok(ping) => Utc
            .timestamp_opt(ping.timestamp, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        Err(_) => "N/A".to_string(),
    };

    Ok(DidiDashboardResponse {
        didi_profile_id: profile_id.to_string(),
        didi_name,
        location: profile.location,
        approval_status: profile.approval_status,
        training_status: profile.training_status,
        total_earnings: profile.total_earnings,
        average_rating: profile.average_rating,
        assigned_orders: assigned.len(),
        pending_orders: pending,
        completed_orders: completed,
        cancelled_orders: cancelled,
        recent_orders,
        training_completion_percentage,
        last_location_update,
    })
}
