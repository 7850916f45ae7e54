//! Location Ping Repository
//!
//! Append-only GPS log per Didi profile; every ping also mirrors the
//! coordinates onto the profile record.

use chrono::{TimeZone, Utc};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, DidiProfileRepository, RepoError, RepoResult};
use crate::db::models::{LocationPing, LocationPingRequest};

#[derive(Clone)]
pub struct LocationPingRepository {
    base: BaseRepository,
}

impl LocationPingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Append a ping and mirror it onto the profile
    pub async fn record(
        &self,
        profile_id: &RecordId,
        request: LocationPingRequest,
    ) -> RepoResult<LocationPing> {
        let ping = LocationPing::new(
            profile_id.clone(),
            request.latitude,
            request.longitude,
            request.location,
            request.source,
            request.accuracy,
        );

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE location_ping SET
                    didi_profile = $didi_profile,
                    latitude = $latitude,
                    longitude = $longitude,
                    location = $location,
                    source = $source,
                    accuracy = $accuracy,
                    timestamp = $timestamp
                RETURN AFTER"#,
            )
            .bind(("didi_profile", ping.didi_profile))
            .bind(("latitude", ping.latitude))
            .bind(("longitude", ping.longitude))
            .bind(("location", ping.location.clone()))
            .bind(("source", ping.source))
            .bind(("accuracy", ping.accuracy))
            .bind(("timestamp", ping.timestamp))
            .await?;

        let created: Option<LocationPing> = result.take(0)?;
        let created =
            created.ok_or_else(|| RepoError::Database("Failed to record ping".to_string()))?;

        DidiProfileRepository::new(self.base.db().clone())
            .update_location(
                profile_id,
                created.latitude,
                created.longitude,
                created.location.clone(),
            )
            .await?;

        tracing::info!(
            profile = %profile_id,
            latitude = created.latitude,
            longitude = created.longitude,
            "Location ping recorded"
        );
        Ok(created)
    }

    /// Full ping history, newest first
    pub async fn history(&self, profile_id: &RecordId) -> RepoResult<Vec<LocationPing>> {
        let pings: Vec<LocationPing> = self
            .base
            .db()
            .query(
                "SELECT * FROM location_ping WHERE didi_profile = $profile ORDER BY timestamp DESC",
            )
            .bind(("profile", profile_id.clone()))
            .await?
            .take(0)?;
        Ok(pings)
    }

    /// Most recent ping; NotFound when the profile has never pinged
    pub async fn last(&self, profile_id: &RecordId) -> RepoResult<LocationPing> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM location_ping WHERE didi_profile = $profile ORDER BY timestamp DESC LIMIT 1",
            )
            .bind(("profile", profile_id.clone()))
            .await?;
        let pings: Vec<LocationPing> = result.take(0)?;
        pings
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound("No location pings found".to_string()))
    }

    /// Pings recorded since UTC midnight
    pub async fn today(&self, profile_id: &RecordId) -> RepoResult<Vec<LocationPing>> {
        let midnight = Utc
            .from_utc_datetime(
                &Utc::now()
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .expect("midnight is a valid time"),
            )
            .timestamp();

        let pings: Vec<LocationPing> = self
            .base
            .db()
            .query(
                "SELECT * FROM location_ping WHERE didi_profile = $profile AND timestamp >= $midnight ORDER BY timestamp DESC",
            )
            .bind(("profile", profile_id.clone()))
            .bind(("midnight", midnight))
            .await?
            .take(0)?;
        Ok(pings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DidiOnboardingRequest;
    use surrealdb::engine::local::Mem;

    async fn test_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        db
    }

    async fn seed_profile(db: &Surreal<Db>) -> RecordId {
        let repo = DidiProfileRepository::new(db.clone());
        let profile = repo
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
            .unwrap();
        profile.id.unwrap()
    }

    fn ping(lat: f64, lon: f64) -> LocationPingRequest {
        LocationPingRequest {
            latitude: lat,
            longitude: lon,
            location: Some("Lucknow".to_string()),
            source: None,
            accuracy: Some(5.0),
        }
    }

    #[tokio::test]
    async fn test_record_mirrors_profile_location() {
        let db = test_db().await;
        let profile_id = seed_profile(&db).await;
        let repo = LocationPingRepository::new(db.clone());

        let recorded = repo.record(&profile_id, ping(26.8467, 80.9462)).await.unwrap();
        assert_eq!(recorded.source, "GPS");

        let profile = DidiProfileRepository::new(db)
            .find_by_id(&profile_id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.latitude, 26.8467);
        assert_eq!(profile.longitude, 80.9462);
    }

    #[tokio::test]
    async fn test_last_requires_a_ping() {
        let db = test_db().await;
        let profile_id = seed_profile(&db).await;
        let repo = LocationPingRepository::new(db);

        assert!(matches!(
            repo.last(&profile_id).await,
            Err(RepoError::NotFound(_))
        ));

        repo.record(&profile_id, ping(1.0, 2.0)).await.unwrap();
        repo.record(&profile_id, ping(3.0, 4.0)).await.unwrap();

        let last = repo.last(&profile_id).await.unwrap();
        assert_eq!(last.latitude, 3.0);
        assert_eq!(repo.history(&profile_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_today_includes_fresh_pings() {
        let db = test_db().await;
        let profile_id = seed_profile(&db).await;
        let repo = LocationPingRepository::new(db);

        repo.record(&profile_id, ping(1.0, 2.0)).await.unwrap();
        let today = repo.today(&profile_id).await.unwrap();
        assert_eq!(today.len(), 1);
    }
}
