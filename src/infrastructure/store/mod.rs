//! Persistence for collection definitions, migration markers and records.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::modules::records::model::Record;
use crate::schema::{Collection, FieldRename};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Everything one migration step writes, committed as a unit.
#[derive(Debug, Clone)]
pub struct MigrationCommit {
    pub file: String,
    pub direction: Direction,
    pub saved: Vec<Collection>,
    pub deleted: Vec<String>,
    pub renamed: Vec<FieldRename>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError>;

    async fn find_collection(&self, name_or_id: &str) -> Result<Option<Collection>, StoreError> {
        let collections = self.list_collections().await?;
        Ok(collections
            .iter()
            .find(|c| c.id == name_or_id)
            .or_else(|| collections.iter().find(|c| c.name.eq_ignore_ascii_case(name_or_id)))
            .cloned())
    }

    /// Applied migration files in ascending order.
    async fn applied_migrations(&self) -> Result<Vec<String>, StoreError>;

    /// Saves/deletes collections and records or clears the migration
    /// marker atomically. Deleting a collection drops its records;
    /// renaming a field moves the stored values to the new key.
    async fn commit_migration(&self, commit: MigrationCommit) -> Result<(), StoreError>;

    async fn insert_record(&self, record: &Record) -> Result<(), StoreError>;

    async fn update_record(&self, record: &Record) -> Result<(), StoreError>;

    /// Returns false when nothing was deleted.
    async fn delete_record(&self, collection_id: &str, id: &str) -> Result<bool, StoreError>;

    async fn find_record(&self, collection_id: &str, id: &str) -> Result<Option<Record>, StoreError>;

    /// All records of a collection ordered by creation time, then id.
    async fn list_records(&self, collection_id: &str) -> Result<Vec<Record>, StoreError>;

    /// Records whose `field` equals `value`, or contains it for array fields.
    async fn find_records_by_field(
        &self,
        collection_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError>;
}

/// Opens PostgreSQL when a database URL is configured, otherwise falls back
/// to a process-local store.
pub async fn connect(database_url: Option<&str>) -> Result<Arc<dyn Store>, StoreError> {
    match database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            info!("✅ In-memory store ready");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
