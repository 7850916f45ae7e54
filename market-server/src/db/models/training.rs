//! Training Models
//!
//! Admin-authored lesson catalog and the per-Didi completion tracker.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Lesson media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "VIDEO")]
    Video,
    #[serde(rename = "ARTICLE")]
    Article,
    #[serde(rename = "QUIZ")]
    Quiz,
    #[serde(rename = "DOCUMENT")]
    Document,
}

/// Lesson difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "BEGINNER")]
    Beginner,
    #[serde(rename = "INTERMEDIATE")]
    Intermediate,
    #[serde(rename = "ADVANCED")]
    Advanced,
}

/// Per-lesson progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStatus {
    #[serde(rename = "NOT_STARTED")]
    NotStarted,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Admin-authored training lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingContent {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub content_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Inline lesson body (articles, quiz JSON)
    pub content: Option<String>,
    #[serde(default)]
    pub sequence_order: i32,
    pub difficulty: Difficulty,
    pub duration_in_minutes: Option<i32>,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

/// Create lesson payload
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingContentCreate {
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub content_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content: Option<String>,
    pub sequence_order: Option<i32>,
    pub difficulty: Difficulty,
    pub duration_in_minutes: Option<i32>,
}

/// Update lesson payload; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingContentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<ContentType>,
    pub content_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content: Option<String>,
    pub sequence_order: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub duration_in_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

impl TrainingContent {
    pub fn from_create(data: TrainingContentCreate) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: None,
            title: data.title,
            description: data.description,
            content_type: data.content_type,
            content_url: data.content_url,
            thumbnail_url: data.thumbnail_url,
            content: data.content,
            sequence_order: data.sequence_order.unwrap_or(0),
            difficulty: data.difficulty,
            duration_in_minutes: data.duration_in_minutes,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-Didi, per-lesson completion tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgress {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub didi_profile: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub training_content: RecordId,
    pub status: ProgressStatus,
    /// 0..=100
    pub progress_percentage: i32,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub created_at: i64,
}

impl TrainingProgress {
    /// Fresh in-progress row for a lesson just started
    pub fn start(didi_profile: RecordId, training_content: RecordId) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: None,
            didi_profile,
            training_content,
            status: ProgressStatus::InProgress,
            progress_percentage: 0,
            started_at: Some(now),
            completed_at: None,
            created_at: now,
        }
    }
}

/// Progress update request
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingProgressUpdate {
    pub progress_percentage: i32,
}
