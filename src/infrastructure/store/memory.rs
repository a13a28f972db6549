use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Direction, MigrationCommit, Store, StoreError};
use crate::modules::records::model::Record;
use crate::schema::Collection;

#[derive(Default)]
struct Inner {
    collections: BTreeMap<String, Collection>,
    migrations: BTreeSet<String>,
    // collection id -> record id -> record
    records: BTreeMap<String, BTreeMap<String, Record>>,
}

/// Process-local store used for tests and database-less runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn field_matches(stored: Option<&Value>, value: &Value) -> bool {
    match stored {
        Some(Value::Array(items)) if !value.is_array() => items.contains(value),
        Some(stored) => stored == value,
        None => value.is_null(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.collections.values().cloned().collect())
    }

    async fn applied_migrations(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.migrations.iter().cloned().collect())
    }

    async fn commit_migration(&self, commit: MigrationCommit) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for id in &commit.deleted {
            inner.collections.remove(id);
            inner.records.remove(id);
        }
        for collection in commit.saved {
            inner.collections.insert(collection.id.clone(), collection);
        }
        for rename in &commit.renamed {
            let Some(records) = inner.records.get_mut(&rename.collection_id) else {
                continue;
            };
            for record in records.values_mut() {
                if let Some(value) = record.data.remove(&rename.from) {
                    record.data.insert(rename.to.clone(), value);
                }
            }
        }
        match commit.direction {
            Direction::Up => inner.migrations.insert(commit.file),
            Direction::Down => inner.migrations.remove(&commit.file),
        };
        Ok(())
    }

    async fn insert_record(&self, record: &Record) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let records = inner.records.entry(record.collection_id.clone()).or_default();
        if records.contains_key(&record.id) {
            return Err(StoreError::Conflict(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update_record(&self, record: &Record) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .records
            .get_mut(&record.collection_id)
            .and_then(|records| records.get_mut(&record.id))
            .ok_or_else(|| StoreError::NotFound(record.id.clone()))?;
        *slot = record.clone();
        Ok(())
    }

    async fn delete_record(&self, collection_id: &str, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .records
            .get_mut(collection_id)
            .and_then(|records| records.remove(id))
            .is_some())
    }

    async fn find_record(&self, collection_id: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .get(collection_id)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn list_records(&self, collection_id: &str) -> Result<Vec<Record>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<Record> = inner
            .records
            .get(collection_id)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn find_records_by_field(
        &self,
        collection_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .list_records(collection_id)
            .await?
            .into_iter()
            .filter(|r| field_matches(r.data.get(field), value))
            .collect())
    }
}
