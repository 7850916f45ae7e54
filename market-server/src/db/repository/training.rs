//! Training Repository
//!
//! Admin-authored lesson catalog and the per-Didi completion tracker.
//! The overall completion percentage is a simple ratio recomputed on
//! demand, never incrementally maintained.

use chrono::Utc;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, DidiProfileRepository, RepoError, RepoResult, parse_record_id_for};
use crate::db::models::{
    Difficulty, ProgressStatus, TrainingContent, TrainingContentCreate, TrainingContentUpdate,
    TrainingProgress, TrainingStatus,
};

const CONTENT_TABLE: &str = "training_content";
const PROGRESS_TABLE: &str = "training_progress";

#[derive(Clone)]
pub struct TrainingRepository {
    base: BaseRepository,
}

impl TrainingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    // =========================================================================
    // Lesson catalog (admin)
    // =========================================================================

    pub async fn create_content(&self, data: TrainingContentCreate) -> RepoResult<TrainingContent> {
        if data.title.trim().is_empty() {
            return Err(RepoError::Validation("title must not be empty".to_string()));
        }
        let content = TrainingContent::from_create(data);

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE training_content SET
                    title = $title,
                    description = $description,
                    content_type = $content_type,
                    content_url = $content_url,
                    thumbnail_url = $thumbnail_url,
                    content = $content,
                    sequence_order = $sequence_order,
                    difficulty = $difficulty,
                    duration_in_minutes = $duration_in_minutes,
                    is_active = true,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("title", content.title))
            .bind(("description", content.description))
            .bind(("content_type", content.content_type))
            .bind(("content_url", content.content_url))
            .bind(("thumbnail_url", content.thumbnail_url))
            .bind(("content", content.content))
            .bind(("sequence_order", content.sequence_order as i64))
            .bind(("difficulty", content.difficulty))
            .bind(("duration_in_minutes", content.duration_in_minutes))
            .bind(("now", content.created_at))
            .await?;

        let created: Option<TrainingContent> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create training content".to_string()))
    }

    pub async fn update_content(
        &self,
        id: &str,
        data: TrainingContentUpdate,
    ) -> RepoResult<TrainingContent> {
        let thing = parse_record_id_for(CONTENT_TABLE, id)?;
        self.find_content(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Training content {} not found", id)))?;

        let mut set_parts: Vec<&str> = Vec::new();
        if data.title.is_some() {
            set_parts.push("title = $title");
        }
        if data.description.is_some() {
            set_parts.push("description = $description");
        }
        if data.content_type.is_some() {
            set_parts.push("content_type = $content_type");
        }
        if data.content_url.is_some() {
            set_parts.push("content_url = $content_url");
        }
        if data.thumbnail_url.is_some() {
            set_parts.push("thumbnail_url = $thumbnail_url");
        }
        if data.content.is_some() {
            set_parts.push("content = $content");
        }
        if data.sequence_order.is_some() {
            set_parts.push("sequence_order = $sequence_order");
        }
        if data.difficulty.is_some() {
            set_parts.push("difficulty = $difficulty");
        }
        if data.duration_in_minutes.is_some() {
            set_parts.push("duration_in_minutes = $duration_in_minutes");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_content(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Training content {} not found", id)));
        }
        set_parts.push("updated_at = $now");

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("thing", thing))
            .bind(("now", Utc::now().timestamp()));

        if let Some(v) = data.title {
            query = query.bind(("title", v));
        }
        if let Some(v) = data.description {
            query = query.bind(("description", v));
        }
        if let Some(v) = data.content_type {
            query = query.bind(("content_type", v));
        }
        if let Some(v) = data.content_url {
            query = query.bind(("content_url", v));
        }
        if let Some(v) = data.thumbnail_url {
            query = query.bind(("thumbnail_url", v));
        }
        if let Some(v) = data.content {
            query = query.bind(("content", v));
        }
        if let Some(v) = data.sequence_order {
            query = query.bind(("sequence_order", v as i64));
        }
        if let Some(v) = data.difficulty {
            query = query.bind(("difficulty", v));
        }
        if let Some(v) = data.duration_in_minutes {
            query = query.bind(("duration_in_minutes", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let mut result = query.await?;
        result
            .take::<Option<TrainingContent>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Training content {} not found", id)))
    }

    pub async fn delete_content(&self, id: &str) -> RepoResult<()> {
        let thing = parse_record_id_for(CONTENT_TABLE, id)?;
        self.find_content(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Training content {} not found", id)))?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(())
    }

    pub async fn find_content(&self, id: &str) -> RepoResult<Option<TrainingContent>> {
        let thing = parse_record_id_for(CONTENT_TABLE, id)?;
        let content: Option<TrainingContent> = self.base.db().select(thing).await?;
        Ok(content)
    }

    /// Active lessons in sequence order
    pub async fn find_active_content(&self) -> RepoResult<Vec<TrainingContent>> {
        let contents: Vec<TrainingContent> = self
            .base
            .db()
            .query(
                "SELECT * FROM training_content WHERE is_active = true ORDER BY sequence_order",
            )
            .await?
            .take(0)?;
        Ok(contents)
    }

    pub async fn find_content_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> RepoResult<Vec<TrainingContent>> {
        let contents: Vec<TrainingContent> = self
            .base
            .db()
            .query(
                "SELECT * FROM training_content WHERE difficulty = $difficulty ORDER BY sequence_order",
            )
            .bind(("difficulty", difficulty))
            .await?
            .take(0)?;
        Ok(contents)
    }

    // =========================================================================
    // Per-Didi progress
    // =========================================================================

    async fn find_progress(
        &self,
        profile_id: &RecordId,
        content_id: &RecordId,
    ) -> RepoResult<Option<TrainingProgress>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM training_progress WHERE didi_profile = $profile AND training_content = $content LIMIT 1",
            )
            .bind(("profile", profile_id.clone()))
            .bind(("content", content_id.clone()))
            .await?;
        let rows: Vec<TrainingProgress> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Start (or restart) a lesson; a completed lesson cannot be restarted
    pub async fn start(
        &self,
        profile_id: &RecordId,
        content_id: &str,
    ) -> RepoResult<TrainingProgress> {
        let content_thing = parse_record_id_for(CONTENT_TABLE, content_id)?;
        self.find_content(content_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Training content {} not found", content_id)))?;

        if let Some(existing) = self.find_progress(profile_id, &content_thing).await? {
            if existing.status == ProgressStatus::Completed {
                return Err(RepoError::BusinessRule(
                    "Training already completed".to_string(),
                ));
            }
            // Restart: back to in-progress from the top
            let thing = existing
                .id
                .ok_or_else(|| RepoError::Database("Progress row without id".to_string()))?;
            let mut result = self
                .base
                .db()
                .query(
                    r#"UPDATE $thing SET
                        status = $status,
                        progress_percentage = 0,
                        started_at = $now
                    RETURN AFTER"#,
                )
                .bind(("thing", thing))
                .bind(("status", ProgressStatus::InProgress))
                .bind(("now", Utc::now().timestamp()))
                .await?;
            return result
                .take::<Option<TrainingProgress>>(0)?
                .ok_or_else(|| RepoError::Database("Failed to restart training".to_string()));
        }

        let progress = TrainingProgress::start(profile_id.clone(), content_thing);
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE training_progress SET
                    didi_profile = $didi_profile,
                    training_content = $training_content,
                    status = $status,
                    progress_percentage = 0,
                    started_at = $started_at,
                    completed_at = NONE,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("didi_profile", progress.didi_profile))
            .bind(("training_content", progress.training_content))
            .bind(("status", ProgressStatus::InProgress))
            .bind(("started_at", progress.started_at))
            .bind(("created_at", progress.created_at))
            .await?;

        let created: Option<TrainingProgress> = result.take(0)?;
        let created =
            created.ok_or_else(|| RepoError::Database("Failed to start training".to_string()))?;

        // First lesson started moves the profile to IN_PROGRESS
        DidiProfileRepository::new(self.base.db().clone())
            .set_training_status(profile_id, TrainingStatus::InProgress, None)
            .await?;

        tracing::info!(profile = %profile_id, content = %content_id, "Training started");
        Ok(created)
    }

    /// Update the completion percentage of a started lesson
    pub async fn update_progress(
        &self,
        profile_id: &RecordId,
        content_id: &str,
        percentage: i32,
    ) -> RepoResult<TrainingProgress> {
        if !(0..=100).contains(&percentage) {
            return Err(RepoError::Validation(
                "Progress percentage must be between 0 and 100".to_string(),
            ));
        }

        let content_thing = parse_record_id_for(CONTENT_TABLE, content_id)?;
        let progress = self
            .find_progress(profile_id, &content_thing)
            .await?
            .ok_or_else(|| RepoError::BusinessRule("Training not started".to_string()))?;
        let thing = progress
            .id
            .ok_or_else(|| RepoError::Database("Progress row without id".to_string()))?;

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET progress_percentage = $pct RETURN AFTER")
            .bind(("thing", thing))
            .bind(("pct", percentage as i64))
            .await?;
        result
            .take::<Option<TrainingProgress>>(0)?
            .ok_or_else(|| RepoError::Database("Failed to update progress".to_string()))
    }

    /// Complete a lesson and recompute the profile's overall status
    pub async fn complete(
        &self,
        profile_id: &RecordId,
        content_id: &str,
    ) -> RepoResult<TrainingProgress> {
        let updated = self
            .finish(profile_id, content_id, ProgressStatus::Completed)
            .await?;

        // All rows completed → profile training COMPLETED
        let rows = self.progress_for(profile_id).await?;
        let completed = rows
            .iter()
            .filter(|p| p.status == ProgressStatus::Completed)
            .count();
        if !rows.is_empty() && completed == rows.len() {
            let now = Utc::now().timestamp();
            DidiProfileRepository::new(self.base.db().clone())
                .set_training_status(profile_id, TrainingStatus::Completed, Some(now))
                .await?;
            tracing::info!(profile = %profile_id, "All training completed");
        }

        Ok(updated)
    }

    /// Mark a lesson failed
    pub async fn fail(
        &self,
        profile_id: &RecordId,
        content_id: &str,
    ) -> RepoResult<TrainingProgress> {
        self.finish(profile_id, content_id, ProgressStatus::Failed)
            .await
    }

    async fn finish(
        &self,
        profile_id: &RecordId,
        content_id: &str,
        status: ProgressStatus,
    ) -> RepoResult<TrainingProgress> {
        let content_thing = parse_record_id_for(CONTENT_TABLE, content_id)?;
        let progress = self
            .find_progress(profile_id, &content_thing)
            .await?
            .ok_or_else(|| RepoError::BusinessRule("Training not started".to_string()))?;
        let thing = progress
            .id
            .ok_or_else(|| RepoError::Database("Progress row without id".to_string()))?;

        let (pct, completed_at) = match status {
            ProgressStatus::Completed => (100_i64, Some(Utc::now().timestamp())),
            _ => (progress.progress_percentage as i64, None),
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    status = $status,
                    progress_percentage = $pct,
                    completed_at = $completed_at
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("status", status))
            .bind(("pct", pct))
            .bind(("completed_at", completed_at))
            .await?;
        result
            .take::<Option<TrainingProgress>>(0)?
            .ok_or_else(|| RepoError::Database("Failed to update training status".to_string()))
    }

    /// All progress rows for a profile, newest first
    pub async fn progress_for(&self, profile_id: &RecordId) -> RepoResult<Vec<TrainingProgress>> {
        let rows: Vec<TrainingProgress> = self
            .base
            .db()
            .query(
                "SELECT * FROM training_progress WHERE didi_profile = $profile ORDER BY created_at DESC",
            )
            .bind(("profile", profile_id.clone()))
            .await?
            .take(0)?;
        Ok(rows)
    }

    /// Overall completion: completed rows / total rows × 100, or 0 with
    /// no rows
    pub async fn completion_percentage(&self, profile_id: &RecordId) -> RepoResult<i32> {
        let rows = self.progress_for(profile_id).await?;
        if rows.is_empty() {
            return Ok(0);
        }
        let completed = rows
            .iter()
            .filter(|p| p.status == ProgressStatus::Completed)
            .count();
        Ok(((completed * 100) / rows.len()) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ContentType, DidiOnboardingRequest};
    use surrealdb::engine::local::Mem;

    async fn test_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        db
    }

    async fn seed_profile(db: &Surreal<Db>) -> RecordId {
        DidiProfileRepository::new(db.clone())
            .register(
                &RecordId::from_table_key("user", "didi1"),
                DidiOnboardingRequest {
                    aadhaar_number: Some("123456789012".to_string()),
                    latitude: Some(0.0),
                    longitude: Some(0.0),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap()
            .id
            .unwrap()
    }

    fn lesson(title: &str, order: i32) -> TrainingContentCreate {
        TrainingContentCreate {
            title: title.to_string(),
            description: None,
            content_type: ContentType::Video,
            content_url: Some("https://example.com/lesson.mp4".to_string()),
            thumbnail_url: None,
            content: None,
            sequence_order: Some(order),
            difficulty: Difficulty::Beginner,
            duration_in_minutes: Some(12),
        }
    }

    #[tokio::test]
    async fn test_completion_ratio() {
        let db = test_db().await;
        let profile = seed_profile(&db).await;
        let repo = TrainingRepository::new(db);

        let a = repo.create_content(lesson("Hygiene", 1)).await.unwrap();
        let b = repo.create_content(lesson("Packaging", 2)).await.unwrap();
        let a_id = a.id.unwrap().to_string();
        let b_id = b.id.unwrap().to_string();

        assert_eq!(repo.completion_percentage(&profile).await.unwrap(), 0);

        repo.start(&profile, &a_id).await.unwrap();
        repo.start(&profile, &b_id).await.unwrap();
        assert_eq!(repo.completion_percentage(&profile).await.unwrap(), 0);

        repo.complete(&profile, &a_id).await.unwrap();
        assert_eq!(repo.completion_percentage(&profile).await.unwrap(), 50);

        repo.complete(&profile, &b_id).await.unwrap();
        assert_eq!(repo.completion_percentage(&profile).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_completing_all_rows_marks_profile_completed() {
        let db = test_db().await;
        let profile = seed_profile(&db).await;
        let repo = TrainingRepository::new(db.clone());

        let lesson_row = repo.create_content(lesson("Hygiene", 1)).await.unwrap();
        let id = lesson_row.id.unwrap().to_string();

        repo.start(&profile, &id).await.unwrap();
        let profile_row = DidiProfileRepository::new(db.clone())
            .find_by_id(&profile.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile_row.training_status, TrainingStatus::InProgress);

        repo.complete(&profile, &id).await.unwrap();
        let profile_row = DidiProfileRepository::new(db)
            .find_by_id(&profile.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile_row.training_status, TrainingStatus::Completed);
        assert!(profile_row.training_completed_at.is_some());
    }

    #[tokio::test]
    async fn test_completed_lesson_cannot_restart() {
        let db = test_db().await;
        let profile = seed_profile(&db).await;
        let repo = TrainingRepository::new(db);

        let lesson_row = repo.create_content(lesson("Hygiene", 1)).await.unwrap();
        let id = lesson_row.id.unwrap().to_string();

        repo.start(&profile, &id).await.unwrap();
        repo.complete(&profile, &id).await.unwrap();
        assert!(matches!(
            repo.start(&profile, &id).await,
            Err(RepoError::BusinessRule(_))
        ));
    }

    #[tokio::test]
    async fn test_progress_bounds() {
        let db = test_db().await;
        let profile = seed_profile(&db).await;
        let repo = TrainingRepository::new(db);

        let lesson_row = repo.create_content(lesson("Hygiene", 1)).await.unwrap();
        let id = lesson_row.id.unwrap().to_string();
        repo.start(&profile, &id).await.unwrap();

        assert!(repo.update_progress(&profile, &id, 101).await.is_err());
        assert!(repo.update_progress(&profile, &id, -1).await.is_err());
        let updated = repo.update_progress(&profile, &id, 60).await.unwrap();
        assert_eq!(updated.progress_percentage, 60);
    }

    #[tokio::test]
    async fn test_progress_requires_start() {
        let db = test_db().await;
        let profile = seed_profile(&db).await;
        let repo = TrainingRepository::new(db);

        let lesson_row = repo.create_content(lesson("Hygiene", 1)).await.unwrap();
        let id = lesson_row.id.unwrap().to_string();

        assert!(matches!(
            repo.update_progress(&profile, &id, 50).await,
            Err(RepoError::BusinessRule(_))
        ));
    }
}
