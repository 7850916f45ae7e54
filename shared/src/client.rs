//! Client-facing auth DTOs
//!
//! Request/response types for the auth surface, shared between the
//! server and its clients.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::role::Role;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Signup request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Role name, e.g. "CUSTOMER" or "SHG_DIDI"
    pub role: String,
    pub phone_number: Option<String>,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub profile_pic: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// OTP verification request (signup and password reset share the shape)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    pub otp: u32,
}

/// Password reset request: stages a new password behind an OTP check
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Partial user update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub profile_pic: Option<String>,
}

/// User information as exposed over the API (never carries the hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_pic: Option<String>,
    pub email_verified: bool,
    pub is_active: bool,
}

/// Plain message response ("Otp verified successfully", "Invalid otp", ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
