//! Repository Module
//!
//! CRUD and domain operations over the SurrealDB tables. All writes go
//! through explicit `CREATE ... SET` / `UPDATE ... SET` queries with
//! native record-id bindings; business rules (stock guards, ownership
//! checks, state transitions) live here next to the data they protect.

// Auth
pub mod user;

// Catalog & commerce
pub mod cart;
pub mod order;
pub mod product;
pub mod recipe;

// Didi domain
pub mod didi_profile;
pub mod location_ping;
pub mod training;

// Re-exports
pub use cart::CartRepository;
pub use didi_profile::DidiProfileRepository;
pub use location_ping::LocationPingRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use recipe::RecipeRepository;
pub use training::TrainingRepository;
pub use user::UserRepository;

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Parse a "table:id" string into a native RecordId
pub fn parse_record_id(id: &str) -> RepoResult<RecordId> {
    id.parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))
}

/// Parse an ID and verify it belongs to the expected table
pub fn parse_record_id_for(table: &str, id: &str) -> RepoResult<RecordId> {
    let rid = parse_record_id(id)?;
    if rid.table() != table {
        return Err(RepoError::Validation(format!(
            "Expected a {} ID, got: {}",
            table, id
        )));
    }
    Ok(rid)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Row shape of `SELECT count() FROM ... GROUP ALL`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct CountRow {
    pub count: u64,
}
