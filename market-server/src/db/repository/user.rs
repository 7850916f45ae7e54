//! User Repository

use chrono::Utc;
use shared::Role;
use shared::client::{SignupRequest, UserUpdateRequest};

use super::{BaseRepository, RepoError, RepoResult, parse_record_id_for};
use crate::auth::{Otp, OtpPurpose, deliver_otp};
use crate::db::models::User;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";

/// Messages surfaced verbatim by the OTP endpoints
pub const OTP_VERIFIED: &str = "Otp verified successfully";
pub const OTP_INVALID: &str = "Invalid otp";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all users
    pub async fn find_all(&self) -> RepoResult<Vec<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY email")
            .await?
            .take(0)?;
        Ok(users)
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let thing = parse_record_id_for(USER_TABLE, id)?;
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Find user by login email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Sign up a new user
    ///
    /// A verified account with the same email is a hard duplicate; an
    /// unverified leftover is deleted and replaced. A signup OTP is
    /// issued and delivered before the row is written.
    pub async fn signup(&self, data: SignupRequest, otp_ttl_minutes: i64) -> RepoResult<User> {
        let role: Role = data
            .role
            .parse()
            .map_err(|e: String| RepoError::Validation(e))?;

        if let Some(existing) = self.find_by_email(&data.email).await? {
            if existing.email_verified {
                return Err(RepoError::Duplicate(format!(
                    "User with email '{}' already exists",
                    data.email
                )));
            }
            // Unverified leftover from an abandoned signup: replace it
            if let Some(id) = &existing.id {
                self.base
                    .db()
                    .query("DELETE $thing")
                    .bind(("thing", id.clone()))
                    .await?;
            }
        }

        let hash_pass = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let otp = Otp::issue(OtpPurpose::SignupVerification, otp_ttl_minutes);
        deliver_otp(&data.email, &data.name, &otp);

        let now = Utc::now().timestamp();
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    name = $name,
                    email = $email,
                    hash_pass = $hash_pass,
                    role = $role,
                    phone_number = $phone_number,
                    dob = $dob,
                    address = $address,
                    profile_pic = $profile_pic,
                    email_verified = false,
                    is_active = true,
                    otp = $otp,
                    pending_password = NONE,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("email", data.email))
            .bind(("hash_pass", hash_pass))
            .bind(("role", role))
            .bind(("phone_number", data.phone_number))
            .bind(("dob", data.dob))
            .bind(("address", data.address))
            .bind(("profile_pic", data.profile_pic))
            .bind(("otp", otp))
            .bind(("now", now))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Verify a signup OTP
    ///
    /// Returns the message exposed to the client; a correct, unexpired
    /// code flips `email_verified` and consumes the OTP.
    pub async fn verify_signup_otp(&self, email: &str, code: u32) -> RepoResult<&'static str> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User with email '{}'", email)))?;

        let valid = user
            .otp
            .as_ref()
            .map(|otp| otp.matches(code, OtpPurpose::SignupVerification))
            .unwrap_or(false);

        if !valid {
            return Ok(OTP_INVALID);
        }

        let id = user
            .id
            .ok_or_else(|| RepoError::Database("User row without id".to_string()))?;
        self.base
            .db()
            .query("UPDATE $thing SET email_verified = true, otp = NONE, updated_at = $now")
            .bind(("thing", id))
            .bind(("now", Utc::now().timestamp()))
            .await?;

        tracing::info!(email = %email, "Email verified");
        Ok(OTP_VERIFIED)
    }

    /// Stage a password reset: issue a reset OTP and park the new hash
    pub async fn request_password_reset(
        &self,
        email: &str,
        new_password: &str,
        otp_ttl_minutes: i64,
    ) -> RepoResult<()> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User with email '{}'", email)))?;

        let otp = Otp::issue(OtpPurpose::PasswordReset, otp_ttl_minutes);
        deliver_otp(email, &user.name, &otp);

        let pending = User::hash_password(new_password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let id = user
            .id
            .ok_or_else(|| RepoError::Database("User row without id".to_string()))?;
        self.base
            .db()
            .query("UPDATE $thing SET otp = $otp, pending_password = $pending, updated_at = $now")
            .bind(("thing", id))
            .bind(("otp", otp))
            .bind(("pending", pending.clone()))
            .bind(("now", Utc::now().timestamp()))
            .await?;

        Ok(())
    }

    /// Verify a password-reset OTP, promoting the staged password
    pub async fn verify_reset_otp(&self, email: &str, code: u32) -> RepoResult<&'static str> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User with email '{}'", email)))?;

        let valid = user
            .otp
            .as_ref()
            .map(|otp| otp.matches(code, OtpPurpose::PasswordReset))
            .unwrap_or(false);

        let Some(pending) = user.pending_password.clone() else {
            return Ok(OTP_INVALID);
        };

        if !valid {
            return Ok(OTP_INVALID);
        }

        let id = user
            .id
            .ok_or_else(|| RepoError::Database("User row without id".to_string()))?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET hash_pass = $pending, pending_password = NONE, otp = NONE, updated_at = $now",
            )
            .bind(("thing", id))
            .bind(("pending", pending))
            .bind(("now", Utc::now().timestamp()))
            .await?;

        tracing::info!(email = %email, "Password reset completed");
        Ok(OTP_VERIFIED)
    }

    /// Partial profile update
    pub async fn update(&self, id: &str, data: UserUpdateRequest) -> RepoResult<User> {
        let thing = parse_record_id_for(USER_TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;

        let hash_pass = match &data.password {
            Some(password) => Some(
                User::hash_password(password)
                    .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?,
            ),
            None => None,
        };

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if hash_pass.is_some() {
            set_parts.push("hash_pass = $hash_pass");
        }
        if data.phone_number.is_some() {
            set_parts.push("phone_number = $phone_number");
        }
        if data.dob.is_some() {
            set_parts.push("dob = $dob");
        }
        if data.address.is_some() {
            set_parts.push("address = $address");
        }
        if data.profile_pic.is_some() {
            set_parts.push("profile_pic = $profile_pic");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)));
        }
        set_parts.push("updated_at = $now");

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("thing", thing))
            .bind(("now", Utc::now().timestamp()));

        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = hash_pass {
            query = query.bind(("hash_pass", v));
        }
        if let Some(v) = data.phone_number {
            query = query.bind(("phone_number", v));
        }
        if let Some(v) = data.dob {
            query = query.bind(("dob", v));
        }
        if let Some(v) = data.address {
            query = query.bind(("address", v));
        }
        if let Some(v) = data.profile_pic {
            query = query.bind(("profile_pic", v));
        }

        let mut result = query.await?;
        result
            .take::<Option<User>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Hard delete a user
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let thing = parse_record_id_for(USER_TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(())
    }
}
