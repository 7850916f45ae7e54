//! User Model

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::Role;
use shared::client::UserInfo;
use surrealdb::RecordId;

use super::serde_helpers;
use crate::auth::Otp;

/// User ID type
pub type UserId = RecordId;

/// Marketplace account
///
/// The password hash never leaves the server (skipped on
/// serialization); the OTP is a tagged value carrying its purpose and
/// expiry, shared by signup verification and password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hash_pass: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub profile_pic: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub email_verified: bool,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// Pending OTP, if one has been issued and not yet consumed
    #[serde(skip_serializing)]
    pub otp: Option<Otp>,
    /// Password hash staged during a reset, promoted on OTP verification
    #[serde(skip_serializing)]
    pub pending_password: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Explicit constructor stamping timestamps (no ORM lifecycle hooks)
    pub fn new(name: String, email: String, hash_pass: String, role: Role) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: None,
            name,
            email,
            hash_pass,
            role,
            phone_number: None,
            dob: None,
            address: None,
            profile_pic: None,
            email_verified: false,
            is_active: true,
            otp: None,
            pending_password: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.hash_pass)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    /// API-safe view of the account
    pub fn to_user_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
            profile_pic: self.profile_pic.clone(),
            email_verified: self.email_verified,
            is_active: self.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = User::hash_password("pickle-secret-1").unwrap();
        let user = User::new(
            "Sita".to_string(),
            "sita@example.com".to_string(),
            hash,
            Role::ShgDidi,
        );

        assert!(user.verify_password("pickle-secret-1").unwrap());
        assert!(!user.verify_password("wrong-password").unwrap());
    }

    #[test]
    fn test_user_info_never_carries_hash() {
        let user = User::new(
            "Sita".to_string(),
            "sita@example.com".to_string(),
            "hash".to_string(),
            Role::Customer,
        );
        let json = serde_json::to_value(user.to_user_info()).unwrap();
        assert!(json.get("hash_pass").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_serialization_skips_secrets() {
        let user = User::new(
            "Sita".to_string(),
            "sita@example.com".to_string(),
            "hash".to_string(),
            Role::Customer,
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hash_pass").is_none());
        assert!(json.get("otp").is_none());
        assert!(json.get("pending_password").is_none());
    }
}
