//! Didi onboarding API module
//!
//! Routes use explicit full paths: `/api/didi/...` is shared with the
//! dashboard and location modules, so nesting a prefix router here
//! would shadow their routes.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/didi/register", post(handler::register))
        .route("/api/didi/my-profile", get(handler::my_profile))
        .route("/api/didi/profile", put(handler::update_profile))
        .route("/api/didi/profile/{id}", get(handler::get_by_id))
        .route("/api/didi/pending", get(handler::pending))
        .route("/api/didi/approved", get(handler::approved))
        .route("/api/didi/approve", post(handler::approve))
        .route("/api/didi/reject", post(handler::reject))
        .route("/api/didi/{id}/suspend", post(handler::suspend))
        .route("/api/didi/{id}/reactivate", post(handler::reactivate))
}
