//! Didi Profile Repository
//!
//! Onboarding and the admin approval workflow. One profile per user,
//! one per aadhaar number; both uniqueness rules are enforced at
//! creation.

use chrono::Utc;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id_for};
use crate::db::models::{
    ApprovalStatus, DidiOnboardingRequest, DidiProfile, TrainingStatus,
};

const PROFILE_TABLE: &str = "didi_profile";

#[derive(Clone)]
pub struct DidiProfileRepository {
    base: BaseRepository,
}

impl DidiProfileRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Register a new Didi profile for the caller
    pub async fn register(
        &self,
        user: &RecordId,
        data: DidiOnboardingRequest,
        aadhaar_image_url: Option<String>,
    ) -> RepoResult<DidiProfile> {
        let aadhaar = data
            .aadhaar_number
            .ok_or_else(|| RepoError::Validation("aadhaar_number is required".to_string()))?;
        let latitude = data
            .latitude
            .ok_or_else(|| RepoError::Validation("latitude is required".to_string()))?;
        let longitude = data
            .longitude
            .ok_or_else(|| RepoError::Validation("longitude is required".to_string()))?;

        if self.find_by_user(user).await?.is_some() {
            return Err(RepoError::Duplicate(
                "Didi profile already exists for this user".to_string(),
            ));
        }
        if self.find_by_aadhaar(&aadhaar).await?.is_some() {
            return Err(RepoError::Duplicate(
                "Aadhaar number already registered".to_string(),
            ));
        }

        let mut profile = DidiProfile::new(user.clone(), aadhaar, latitude, longitude);
        profile.aadhaar_image_url = aadhaar_image_url;
        profile.bank_account_number = data.bank_account_number;
        profile.bank_ifsc = data.bank_ifsc;
        profile.bank_name = data.bank_name;
        profile.account_holder_name = data.account_holder_name;
        profile.location = data.location;

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE didi_profile SET
                    user = $user,
                    aadhaar_number = $aadhaar_number,
                    aadhaar_image_url = $aadhaar_image_url,
                    bank_account_number = $bank_account_number,
                    bank_ifsc = $bank_ifsc,
                    bank_name = $bank_name,
                    account_holder_name = $account_holder_name,
                    latitude = $latitude,
                    longitude = $longitude,
                    location = $location,
                    approval_status = $approval_status,
                    rejection_reason = NONE,
                    training_status = $training_status,
                    training_completed_at = NONE,
                    total_earnings = 0.0,
                    average_rating = 0.0,
                    total_orders = 0,
                    total_sales = 0.0,
                    created_at = $now,
                    approved_at = NONE,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("user", profile.user))
            .bind(("aadhaar_number", profile.aadhaar_number))
            .bind(("aadhaar_image_url", profile.aadhaar_image_url))
            .bind(("bank_account_number", profile.bank_account_number))
            .bind(("bank_ifsc", profile.bank_ifsc))
            .bind(("bank_name", profile.bank_name))
            .bind(("account_holder_name", profile.account_holder_name))
            .bind(("latitude", profile.latitude))
            .bind(("longitude", profile.longitude))
            .bind(("location", profile.location))
            .bind(("approval_status", ApprovalStatus::Pending))
            .bind(("training_status", TrainingStatus::NotStarted))
            .bind(("now", profile.created_at))
            .await?;

        let created: Option<DidiProfile> = result.take(0)?;
        let created =
            created.ok_or_else(|| RepoError::Database("Failed to create profile".to_string()))?;

        tracing::info!(
            profile = %created.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            "Didi registered, awaiting approval"
        );
        Ok(created)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<DidiProfile>> {
        let thing = parse_record_id_for(PROFILE_TABLE, id)?;
        let profile: Option<DidiProfile> = self.base.db().select(thing).await?;
        Ok(profile)
    }

    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Option<DidiProfile>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM didi_profile WHERE user = $user LIMIT 1")
            .bind(("user", user.clone()))
            .await?;
        let profiles: Vec<DidiProfile> = result.take(0)?;
        Ok(profiles.into_iter().next())
    }

    pub async fn find_by_aadhaar(&self, aadhaar: &str) -> RepoResult<Option<DidiProfile>> {
        let aadhaar_owned = aadhaar.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM didi_profile WHERE aadhaar_number = $aadhaar LIMIT 1")
            .bind(("aadhaar", aadhaar_owned))
            .await?;
        let profiles: Vec<DidiProfile> = result.take(0)?;
        Ok(profiles.into_iter().next())
    }

    /// Profiles in a given approval state, oldest first
    pub async fn find_by_approval_status(
        &self,
        status: ApprovalStatus,
    ) -> RepoResult<Vec<DidiProfile>> {
        let profiles: Vec<DidiProfile> = self
            .base
            .db()
            .query(
                "SELECT * FROM didi_profile WHERE approval_status = $status ORDER BY created_at",
            )
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(profiles)
    }

    /// Approve a pending profile (admin)
    pub async fn approve(&self, id: &str) -> RepoResult<DidiProfile> {
        let thing = self.existing(id).await?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    approval_status = $status,
                    rejection_reason = NONE,
                    approved_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("status", ApprovalStatus::Approved))
            .bind(("now", Utc::now().timestamp()))
            .await?;
        let updated = result
            .take::<Option<DidiProfile>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Didi profile {} not found", id)))?;

        tracing::info!(profile = %id, "Didi approved");
        Ok(updated)
    }

    /// Reject a profile with a reason (admin)
    pub async fn reject(&self, id: &str, reason: Option<String>) -> RepoResult<DidiProfile> {
        self.set_approval(id, ApprovalStatus::Rejected, reason).await
    }

    /// Suspend an approved profile (admin)
    pub async fn suspend(&self, id: &str, reason: Option<String>) -> RepoResult<DidiProfile> {
        self.set_approval(id, ApprovalStatus::Suspended, reason).await
    }

    /// Lift a suspension / rejection back to APPROVED (admin)
    pub async fn reactivate(&self, id: &str) -> RepoResult<DidiProfile> {
        self.set_approval(id, ApprovalStatus::Approved, None).await
    }

    async fn set_approval(
        &self,
        id: &str,
        status: ApprovalStatus,
        reason: Option<String>,
    ) -> RepoResult<DidiProfile> {
        let thing = self.existing(id).await?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    approval_status = $status,
                    rejection_reason = $reason,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("status", status))
            .bind(("reason", reason))
            .bind(("now", Utc::now().timestamp()))
            .await?;
        let updated = result
            .take::<Option<DidiProfile>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Didi profile {} not found", id)))?;

        tracing::info!(profile = %id, status = ?status, "Didi approval status changed");
        Ok(updated)
    }

    /// Owner partial update of KYC / location fields
    pub async fn update_profile(
        &self,
        user: &RecordId,
        data: DidiOnboardingRequest,
        aadhaar_image_url: Option<String>,
    ) -> RepoResult<DidiProfile> {
        let profile = self
            .find_by_user(user)
            .await?
            .ok_or_else(|| RepoError::NotFound("Didi profile not found".to_string()))?;
        let thing = profile
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Profile row without id".to_string()))?;

        if let Some(ref aadhaar) = data.aadhaar_number
            && aadhaar != &profile.aadhaar_number
            && self.find_by_aadhaar(aadhaar).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                "Aadhaar number already registered".to_string(),
            ));
        }

        let mut set_parts: Vec<&str> = Vec::new();
        if data.aadhaar_number.is_some() {
            set_parts.push("aadhaar_number = $aadhaar_number");
        }
        if aadhaar_image_url.is_some() {
            set_parts.push("aadhaar_image_url = $aadhaar_image_url");
        }
        if data.bank_account_number.is_some() {
            set_parts.push("bank_account_number = $bank_account_number");
        }
        if data.bank_ifsc.is_some() {
            set_parts.push("bank_ifsc = $bank_ifsc");
        }
        if data.bank_name.is_some() {
            set_parts.push("bank_name = $bank_name");
        }
        if data.account_holder_name.is_some() {
            set_parts.push("account_holder_name = $account_holder_name");
        }
        if data.latitude.is_some() {
            set_parts.push("latitude = $latitude");
        }
        if data.longitude.is_some() {
            set_parts.push("longitude = $longitude");
        }
        if data.location.is_some() {
            set_parts.push("location = $location");
        }

        if set_parts.is_empty() {
            return Ok(profile);
        }
        set_parts.push("updated_at = $now");

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("thing", thing))
            .bind(("now", Utc::now().timestamp()));

        if let Some(v) = data.aadhaar_number {
            query = query.bind(("aadhaar_number", v));
        }
        if let Some(v) = aadhaar_image_url {
            query = query.bind(("aadhaar_image_url", v));
        }
        if let Some(v) = data.bank_account_number {
            query = query.bind(("bank_account_number", v));
        }
        if let Some(v) = data.bank_ifsc {
            query = query.bind(("bank_ifsc", v));
        }
        if let Some(v) = data.bank_name {
            query = query.bind(("bank_name", v));
        }
        if let Some(v) = data.account_holder_name {
            query = query.bind(("account_holder_name", v));
        }
        if let Some(v) = data.latitude {
            query = query.bind(("latitude", v));
        }
        if let Some(v) = data.longitude {
            query = query.bind(("longitude", v));
        }
        if let Some(v) = data.location {
            query = query.bind(("location", v));
        }

        let mut result = query.await?;
        result
            .take::<Option<DidiProfile>>(0)?
            .ok_or_else(|| RepoError::NotFound("Didi profile not found".to_string()))
    }

    /// Mirror the latest location ping onto the profile
    pub async fn update_location(
        &self,
        profile_id: &RecordId,
        latitude: f64,
        longitude: f64,
        location: Option<String>,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query(
                r#"UPDATE $thing SET
                    latitude = $latitude,
                    longitude = $longitude,
                    location = $location,
                    updated_at = $now"#,
            )
            .bind(("thing", profile_id.clone()))
            .bind(("latitude", latitude))
            .bind(("longitude", longitude))
            .bind(("location", location))
            .bind(("now", Utc::now().timestamp()))
            .await?;
        Ok(())
    }

    /// Write the overall training status (driven by the training module)
    pub async fn set_training_status(
        &self,
        profile_id: &RecordId,
        status: TrainingStatus,
        completed_at: Option<i64>,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query(
                r#"UPDATE $thing SET
                    training_status = $status,
                    training_completed_at = $completed_at,
                    updated_at = $now"#,
            )
            .bind(("thing", profile_id.clone()))
            .bind(("status", status))
            .bind(("completed_at", completed_at))
            .bind(("now", Utc::now().timestamp()))
            .await?;
        Ok(())
    }

    async fn existing(&self, id: &str) -> RepoResult<RecordId> {
        let thing = parse_record_id_for(PROFILE_TABLE, id)?;
        let profile: Option<DidiProfile> = self.base.db().select(thing.clone()).await?;
        profile.ok_or_else(|| RepoError::NotFound(format!("Didi profile {} not found", id)))?;
        Ok(thing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::local::Mem;

    async fn test_repo() -> DidiProfileRepository {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        DidiProfileRepository::new(db)
    }

    fn user_id(key: &str) -> RecordId {
        RecordId::from_table_key("user", key)
    }

    fn registration(aadhaar: &str) -> DidiOnboardingRequest {
        DidiOnboardingRequest {
            aadhaar_number: Some(aadhaar.to_string()),
            latitude: Some(26.8467),
            longitude: Some(80.9462),
            location: Some("Lucknow".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_starts_pending() {
        let repo = test_repo().await;
        let profile = repo
            .register(&user_id("u1"), registration("123456789012"), None)
            .await
            .unwrap();
        assert_eq!(profile.approval_status, ApprovalStatus::Pending);
        assert_eq!(profile.training_status, TrainingStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_one_profile_per_user() {
        let repo = test_repo().await;
        let user = user_id("u1");
        repo.register(&user, registration("123456789012"), None)
            .await
            .unwrap();
        assert!(matches!(
            repo.register(&user, registration("999956789012"), None).await,
            Err(RepoError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_one_profile_per_aadhaar() {
        let repo = test_repo().await;
        repo.register(&user_id("u1"), registration("123456789012"), None)
            .await
            .unwrap();
        assert!(matches!(
            repo.register(&user_id("u2"), registration("123456789012"), None)
                .await,
            Err(RepoError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_approval_workflow() {
        let repo = test_repo().await;
        let profile = repo
            .register(&user_id("u1"), registration("123456789012"), None)
            .await
            .unwrap();
        let id = profile.id.as_ref().unwrap().to_string();

        let approved = repo.approve(&id).await.unwrap();
        assert_eq!(approved.approval_status, ApprovalStatus::Approved);
        assert!(approved.approved_at.is_some());

        let suspended = repo.suspend(&id, Some("complaints".to_string())).await.unwrap();
        assert_eq!(suspended.approval_status, ApprovalStatus::Suspended);
        assert_eq!(suspended.rejection_reason.as_deref(), Some("complaints"));

        let reactivated = repo.reactivate(&id).await.unwrap();
        assert_eq!(reactivated.approval_status, ApprovalStatus::Approved);
        assert!(reactivated.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn test_pending_filter() {
        let repo = test_repo().await;
        let a = repo
            .register(&user_id("u1"), registration("123456789012"), None)
            .await
            .unwrap();
        repo.register(&user_id("u2"), registration("223456789012"), None)
            .await
            .unwrap();

        repo.approve(&a.id.as_ref().unwrap().to_string()).await.unwrap();

        let pending = repo
            .find_by_approval_status(ApprovalStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }
}
