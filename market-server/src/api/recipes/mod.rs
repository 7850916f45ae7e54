//! Recipes API module
//!
//! `/api/recipes/share/:token` is public (skipped by the auth
//! middleware); everything else requires a logged-in caller.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/recipes", recipe_routes())
}

fn recipe_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::my_recipes).post(handler::create))
        .route("/saved", get(handler::my_saved_recipes))
        .route("/calculate-price", post(handler::calculate_price))
        .route("/share/{token}", get(handler::get_by_share_token))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/save", put(handler::save))
        .route("/{id}/share", put(handler::share))
}
