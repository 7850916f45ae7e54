//! Signup / OTP verification / password reset flows against an
//! in-memory database.

use surrealdb::engine::local::{Db, Mem};
use surrealdb::Surreal;

use market_server::db::repository::{RepoError, UserRepository, user::{OTP_INVALID, OTP_VERIFIED}};
use shared::client::SignupRequest;

const OTP_TTL: i64 = 15;

async fn test_repo() -> UserRepository {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    UserRepository::new(db)
}

fn signup(email: &str) -> SignupRequest {
    SignupRequest {
        name: "Asha".to_string(),
        email: email.to_string(),
        password: "pickle-secret-1".to_string(),
        role: "CUSTOMER".to_string(),
        phone_number: Some("+911234567890".to_string()),
        dob: None,
        address: None,
        profile_pic: None,
    }
}

#[tokio::test]
async fn signup_issues_a_signup_otp() {
    let repo = test_repo().await;
    let user = repo.signup(signup("asha@example.com"), OTP_TTL).await.unwrap();

    assert!(!user.email_verified);
    let stored = repo
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    let otp = stored.otp.expect("signup must stamp an OTP");
    assert!((1000..=9999).contains(&otp.code));
}

#[tokio::test]
async fn wrong_otp_is_rejected_correct_otp_verifies() {
    let repo = test_repo().await;
    repo.signup(signup("asha@example.com"), OTP_TTL).await.unwrap();

    let stored = repo
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    let code = stored.otp.as_ref().unwrap().code;
    let wrong = if code == 9999 { 1000 } else { code + 1 };

    let message = repo
        .verify_signup_otp("asha@example.com", wrong)
        .await
        .unwrap();
    assert_eq!(message, OTP_INVALID);
    assert!(
        !repo
            .find_by_email("asha@example.com")
            .await
            .unwrap()
            .unwrap()
            .email_verified
    );

    let message = repo
        .verify_signup_otp("asha@example.com", code)
        .await
        .unwrap();
    assert_eq!(message, OTP_VERIFIED);

    let verified = repo
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(verified.email_verified);
    assert!(verified.otp.is_none(), "OTP is consumed on verification");
}

#[tokio::test]
async fn verified_duplicate_email_is_rejected() {
    let repo = test_repo().await;
    repo.signup(signup("asha@example.com"), OTP_TTL).await.unwrap();

    let code = repo
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap()
        .otp
        .unwrap()
        .code;
    repo.verify_signup_otp("asha@example.com", code).await.unwrap();

    let err = repo
        .signup(signup("asha@example.com"), OTP_TTL)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn unverified_leftover_is_replaced_on_resignup() {
    let repo = test_repo().await;
    repo.signup(signup("asha@example.com"), OTP_TTL).await.unwrap();

    // Abandoned signup; trying again simply replaces the row
    let replacement = repo.signup(signup("asha@example.com"), OTP_TTL).await;
    assert!(replacement.is_ok());
}

#[tokio::test]
async fn password_reset_is_gated_by_its_own_otp() {
    let repo = test_repo().await;
    repo.signup(signup("asha@example.com"), OTP_TTL).await.unwrap();
    let code = repo
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap()
        .otp
        .unwrap()
        .code;
    repo.verify_signup_otp("asha@example.com", code).await.unwrap();

    repo.request_password_reset("asha@example.com", "new-secret-42", OTP_TTL)
        .await
        .unwrap();

    let staged = repo
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    let reset_code = staged.otp.as_ref().unwrap().code;

    // Old password still valid until the OTP confirms the reset
    assert!(staged.verify_password("pickle-secret-1").unwrap());

    // A signup-purpose check with the reset code must not verify email
    let message = repo
        .verify_signup_otp("asha@example.com", reset_code)
        .await
        .unwrap();
    assert_eq!(message, OTP_INVALID);

    let message = repo
        .verify_reset_otp("asha@example.com", reset_code)
        .await
        .unwrap();
    assert_eq!(message, OTP_VERIFIED);

    let after = repo
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(after.verify_password("new-secret-42").unwrap());
    assert!(!after.verify_password("pickle-secret-1").unwrap());
}

#[tokio::test]
async fn invalid_role_string_is_a_validation_error() {
    let repo = test_repo().await;
    let mut req = signup("asha@example.com");
    req.role = "SUPERVISOR".to_string();

    let err = repo.signup(req, OTP_TTL).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}
