//! Auth API module
//!
//! Public endpoints of the user surface: signup, login and the OTP
//! verification flows. Lives under `/api/v1/users` next to the account
//! management endpoints in [`crate::api::users`].

mod handler;

use axum::{
    Router,
    routing::{post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/v1/users/signup", post(handler::signup))
        .route("/api/v1/users/login", post(handler::login))
        .route("/api/v1/users/verify-otp", post(handler::verify_otp))
        .route(
            "/api/v1/users/verify-otp-password",
            post(handler::verify_otp_password),
        )
        .route("/api/v1/users/reset-password", put(handler::reset_password))
}
