//! Authentication Handlers
//!
//! Signup with OTP email verification, login with JWT issuance, and
//! the OTP-gated password reset flow.

use std::time::Duration;

use axum::{Json, extract::State};
use validator::Validate;

use shared::client::{
    LoginRequest, LoginResponse, MessageResponse, PasswordResetRequest, SignupRequest,
    VerifyOtpRequest,
};

use crate::core::ServerState;
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResult};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/v1/users/signup - register a new account
///
/// A verified account with the same email is rejected; an unverified
/// leftover is replaced. The signup OTP is issued before the row is
/// written.
pub async fn signup(
    State(state): State<ServerState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<Json<shared::client::UserInfo>> {
    req.validate()?;

    let repo = UserRepository::new(state.get_db());
    let user = repo.signup(req, state.config.otp_ttl_minutes).await?;

    tracing::info!(email = %user.email, role = %user.role, "User signed up, awaiting OTP verification");
    Ok(Json(user.to_user_info()))
}

/// POST /api/v1/users/login - authenticate and issue a JWT
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    req.validate()?;

    let repo = UserRepository::new(state.get_db());
    let user = repo.find_by_email(&req.email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let user = match user {
        Some(u) => u,
        None => {
            tracing::warn!(email = %req.email, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    if !user.email_verified {
        return Err(AppError::business_rule("User is not verified yet"));
    }
    if !user.is_active {
        return Err(AppError::forbidden("Account has been disabled"));
    }

    let password_valid = user
        .verify_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !password_valid {
        tracing::warn!(email = %req.email, "Login failed - invalid credentials");
        return Err(AppError::invalid_credentials());
    }

    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    let token = state
        .get_jwt_service()
        .generate_token(&user_id, &user.email, &user.name, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = %user_id, email = %user.email, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.to_user_info(),
    }))
}

/// POST /api/v1/users/verify-otp - verify the signup OTP
///
/// The response body carries the verification outcome as a message
/// ("Otp verified successfully" / "Invalid otp"), matching the
/// behavior clients already depend on.
pub async fn verify_otp(
    State(state): State<ServerState>,
    Json(req): Json<VerifyOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    req.validate()?;

    let repo = UserRepository::new(state.get_db());
    let message = repo.verify_signup_otp(&req.email, req.otp).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// POST /api/v1/users/verify-otp-password - confirm a password reset
pub async fn verify_otp_password(
    State(state): State<ServerState>,
    Json(req): Json<VerifyOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    req.validate()?;

    let repo = UserRepository::new(state.get_db());
    let message = repo.verify_reset_otp(&req.email, req.otp).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// PUT /api/v1/users/reset-password - stage a new password behind an OTP
pub async fn reset_password(
    State(state): State<ServerState>,
    Json(req): Json<PasswordResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    req.validate()?;

    let repo = UserRepository::new(state.get_db());
    repo.request_password_reset(&req.email, &req.password, state.config.otp_ttl_minutes)
        .await?;
    Ok(Json(MessageResponse::new(
        "Otp sent for password reset verification",
    )))
}
