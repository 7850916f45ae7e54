//! Training API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/training", training_routes())
}

fn training_routes() -> Router<ServerState> {
    Router::new()
        // Lesson catalog
        .route(
            "/content",
            get(handler::list_content).post(handler::create_content),
        )
        .route(
            "/content/{id}",
            get(handler::get_content)
                .put(handler::update_content)
                .delete(handler::delete_content),
        )
        .route(
            "/content/difficulty/{difficulty}",
            get(handler::list_by_difficulty),
        )
        // Per-Didi progress
        .route("/my-progress", get(handler::my_progress))
        .route("/completion", get(handler::completion))
        .route("/{content_id}/start", post(handler::start))
        .route("/{content_id}/progress", put(handler::update_progress))
        .route("/{content_id}/complete", post(handler::complete))
        .route("/{content_id}/fail", post(handler::fail))
}
