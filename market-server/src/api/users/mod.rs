//! Users API module
//!
//! Authenticated account management under `/api/v1/users`.

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let admin_routes = Router::new()
        .route("/api/v1/users/all", get(handler::list))
        .route("/api/v1/users/{id}", delete(handler::delete_by_id))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/api/v1/users/logged-in-user", get(handler::logged_in_user))
        .route("/api/v1/users/update/{id}", put(handler::update))
        .route("/api/v1/users", delete(handler::delete_self))
        .merge(admin_routes)
}
