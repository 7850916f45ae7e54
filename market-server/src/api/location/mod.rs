//! Location tracking API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/didi/location/ping", post(handler::ping))
        .route("/api/didi/location/history", get(handler::history))
        .route("/api/didi/location/last", get(handler::last))
        .route("/api/didi/location/today", get(handler::today))
}
