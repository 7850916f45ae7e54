//! Location Ping Model

use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Append-only GPS log row for a Didi profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPing {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub didi_profile: RecordId,
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    /// "GPS", "NETWORK", "MANUAL"
    pub source: String,
    /// Reported accuracy in meters
    pub accuracy: Option<f64>,
    /// Stamped at insert
    pub timestamp: i64,
}

impl LocationPing {
    pub fn new(
        didi_profile: RecordId,
        latitude: f64,
        longitude: f64,
        location: Option<String>,
        source: Option<String>,
        accuracy: Option<f64>,
    ) -> Self {
        Self {
            id: None,
            didi_profile,
            latitude,
            longitude,
            location,
            source: source.unwrap_or_else(|| "GPS".to_string()),
            accuracy,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Ping request
#[derive(Debug, Clone, Deserialize)]
pub struct LocationPingRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub source: Option<String>,
    pub accuracy: Option<f64>,
}
