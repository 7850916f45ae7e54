//! Didi dashboard API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/didi/dashboard", get(handler::my_dashboard))
        .route("/api/didi/dashboard/{profile_id}", get(handler::dashboard_by_id))
}
