//! One-time passwords
//!
//! OTPs are tagged values: a 4-digit code bound to a purpose (signup
//! verification or password reset) with an expiry timestamp. A code
//! issued for one purpose never validates for the other.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What an OTP was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpPurpose {
    SignupVerification,
    PasswordReset,
}

/// A pending one-time password stored on the user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Otp {
    /// 4-digit code
    pub code: u32,
    /// Purpose the code was issued for
    pub purpose: OtpPurpose,
    /// Unix timestamp after which the code no longer validates
    pub expires_at: i64,
}

impl Otp {
    /// Issue a fresh 4-digit OTP valid for `ttl_minutes`
    pub fn issue(purpose: OtpPurpose, ttl_minutes: i64) -> Self {
        let code = rand::thread_rng().gen_range(1000..=9999);
        Self {
            code,
            purpose,
            expires_at: Utc::now().timestamp() + ttl_minutes * 60,
        }
    }

    /// Check a submitted code against this OTP
    pub fn matches(&self, code: u32, purpose: OtpPurpose) -> bool {
        self.purpose == purpose && self.code == code && Utc::now().timestamp() <= self.expires_at
    }
}

/// Deliver an OTP to the user
///
/// Delivery is a logged side channel so the verification flow stays
/// testable without a mail server; an SMTP sender can hook in here.
pub fn deliver_otp(email: &str, name: &str, otp: &Otp) {
    tracing::info!(
        email = %email,
        name = %name,
        code = otp.code,
        purpose = ?otp.purpose,
        "OTP issued"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_is_four_digits() {
        for _ in 0..50 {
            let otp = Otp::issue(OtpPurpose::SignupVerification, 15);
            assert!((1000..=9999).contains(&otp.code));
        }
    }

    #[test]
    fn test_otp_matches_same_purpose_only() {
        let otp = Otp::issue(OtpPurpose::SignupVerification, 15);
        assert!(otp.matches(otp.code, OtpPurpose::SignupVerification));
        assert!(!otp.matches(otp.code, OtpPurpose::PasswordReset));
    }

    #[test]
    fn test_wrong_code_rejected() {
        let otp = Otp::issue(OtpPurpose::PasswordReset, 15);
        let wrong = if otp.code == 9999 { 1000 } else { otp.code + 1 };
        assert!(!otp.matches(wrong, OtpPurpose::PasswordReset));
    }

    #[test]
    fn test_expired_otp_rejected() {
        let mut otp = Otp::issue(OtpPurpose::SignupVerification, 15);
        otp.expires_at = Utc::now().timestamp() - 1;
        assert!(!otp.matches(otp.code, OtpPurpose::SignupVerification));
    }
}
