use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sqlx::types::Json;
use sqlx::{Executor, FromRow};
use time::OffsetDateTime;
use tracing::debug;

use super::{Direction, MigrationCommit, Store, StoreError};
use crate::infrastructure::db::pool::{DbPool, connect_to_db};
use crate::modules::records::model::Record;
use crate::schema::Collection;

#[derive(FromRow)]
struct RecordRow {
    collection_id: String,
    id: String,
    created: OffsetDateTime,
    updated: OffsetDateTime,
    data: Json<Map<String, Value>>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            collection_id: row.collection_id,
            created: row.created,
            updated: row.updated,
            data: row.data.0,
        }
    }
}

const RECORD_COLUMNS: &str = "collection_id, id, created, updated, data";

/// PostgreSQL-backed store. Collection definitions and record payloads are
/// JSONB documents.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = connect_to_db(url).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: DbPool) -> Result<Self, StoreError> {
        (&pool).execute(include_str!("setup.sql")).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let rows: Vec<(Json<Collection>,)> =
            sqlx::query_as("SELECT definition FROM _collections ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(definition,)| definition.0).collect())
    }

    async fn applied_migrations(&self) -> Result<Vec<String>, StoreError> {
        let files: Vec<String> = sqlx::query_scalar("SELECT file FROM _migrations ORDER BY file")
            .fetch_all(&self.pool)
            .await?;
        Ok(files)
    }

    async fn commit_migration(&self, commit: MigrationCommit) -> Result<(), StoreError> {
        debug!(file = %commit.file, direction = ?commit.direction, "Committing migration");
        let mut tx = self.pool.begin().await?;

        for id in &commit.deleted {
            sqlx::query("DELETE FROM _records WHERE collection_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM _collections WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        for collection in &commit.saved {
            sqlx::query(
                "INSERT INTO _collections (id, name, definition) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, definition = EXCLUDED.definition",
            )
            .bind(&collection.id)
            .bind(&collection.name)
            .bind(Json(collection))
            .execute(&mut *tx)
            .await?;
        }

        for rename in &commit.renamed {
            sqlx::query(
                "UPDATE _records SET data = (data - $2) || jsonb_build_object($3::text, data -> $2) \
                 WHERE collection_id = $1 AND data ? $2",
            )
            .bind(&rename.collection_id)
            .bind(&rename.from)
            .bind(&rename.to)
            .execute(&mut *tx)
            .await?;
        }

        match commit.direction {
            Direction::Up => {
                sqlx::query("INSERT INTO _migrations (file) VALUES ($1)")
                    .bind(&commit.file)
                    .execute(&mut *tx)
                    .await?;
            }
            Direction::Down => {
                sqlx::query("DELETE FROM _migrations WHERE file = $1")
                    .bind(&commit.file)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_record(&self, record: &Record) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO _records (collection_id, id, created, updated, data) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING",
        )
        .bind(&record.collection_id)
        .bind(&record.id)
        .bind(record.created)
        .bind(record.updated)
        .bind(Json(&record.data))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(record.id.clone()));
        }
        Ok(())
    }

    async fn update_record(&self, record: &Record) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE _records SET updated = $1, data = $2 WHERE collection_id = $3 AND id = $4",
        )
        .bind(record.updated)
        .bind(Json(&record.data))
        .bind(&record.collection_id)
        .bind(&record.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.id.clone()));
        }
        Ok(())
    }

    async fn delete_record(&self, collection_id: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM _records WHERE collection_id = $1 AND id = $2")
            .bind(collection_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_record(&self, collection_id: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let row: Option<RecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM _records WHERE collection_id = $1 AND id = $2"
        ))
        .bind(collection_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Record::from))
    }

    async fn list_records(&self, collection_id: &str) -> Result<Vec<Record>, StoreError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM _records WHERE collection_id = $1 ORDER BY created, id"
        ))
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn find_records_by_field(
        &self,
        collection_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        // jsonb containment matches both scalar fields and array members
        let needle = if value.is_array() {
            json!({ field: value })
        } else {
            json!({ field: [value] })
        };
        let scalar = json!({ field: value });
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM _records \
             WHERE collection_id = $1 AND (data @> $2 OR data @> $3) ORDER BY created, id"
        ))
        .bind(collection_id)
        .bind(Json(scalar))
        .bind(Json(needle))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }
}
