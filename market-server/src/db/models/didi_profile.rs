//! Didi Profile Model
//!
//! Onboarding record for an SHG Didi: KYC fields, GPS coordinates, the
//! approval workflow state and cumulative performance counters.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Didi profile ID type
pub type DidiProfileId = RecordId;

/// Admin-gated approval workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "SUSPENDED")]
    Suspended,
}

/// Overall training state mirrored onto the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    #[serde(rename = "NOT_STARTED")]
    NotStarted,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Seller onboarding record (1:1 with user, unique per aadhaar number)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidiProfile {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<DidiProfileId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    // KYC
    pub aadhaar_number: String,
    pub aadhaar_image_url: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder_name: Option<String>,
    // Location (mirrored from the latest ping)
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    // Workflow
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub training_status: TrainingStatus,
    pub training_completed_at: Option<i64>,
    // Performance counters
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_orders: i32,
    #[serde(default)]
    pub total_sales: f64,
    pub created_at: i64,
    pub approved_at: Option<i64>,
    pub updated_at: i64,
}

impl DidiProfile {
    /// New registration: pending approval, training not started
    pub fn new(
        user: RecordId,
        aadhaar_number: String,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: None,
            user,
            aadhaar_number,
            aadhaar_image_url: None,
            bank_account_number: None,
            bank_ifsc: None,
            bank_name: None,
            account_holder_name: None,
            latitude,
            longitude,
            location: None,
            approval_status: ApprovalStatus::Pending,
            rejection_reason: None,
            training_status: TrainingStatus::NotStarted,
            training_completed_at: None,
            total_earnings: 0.0,
            average_rating: 0.0,
            total_orders: 0,
            total_sales: 0.0,
            created_at: now,
            approved_at: None,
            updated_at: now,
        }
    }
}

/// Registration / profile update request (aadhaar image arrives as a
/// multipart file alongside these fields)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DidiOnboardingRequest {
    pub aadhaar_number: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
}

/// Admin approval/rejection request
#[derive(Debug, Clone, Deserialize)]
pub struct DidiApprovalRequest {
    /// "didi_profile:xxxx"
    pub didi_profile_id: String,
    pub rejection_reason: Option<String>,
}
