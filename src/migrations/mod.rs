//! Versioned, reversible schema migrations.
//!
//! A migration is a pair of functions over a [`Schemas`] working copy.
//! The migrator loads the stored collections, runs one step against a copy,
//! and hands the difference plus the applied marker to the store in a
//! single commit. Files are applied in name order; the unix timestamp
//! prefix makes that chronological.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::store::{Direction, MigrationCommit, Store, StoreError};
use crate::schema::{SchemaError, Schemas};

pub mod m1699764243_created_transcodes;
pub mod m1699764454_updated_transcodes;
pub mod m1699764494_created_settings;
pub mod system;

pub type MigrationFn = fn(&mut Schemas) -> Result<(), SchemaError>;

#[derive(Clone, Copy)]
pub struct Migration {
    pub file: &'static str,
    pub up: MigrationFn,
    pub down: MigrationFn,
}

/// Application migrations in the order they were authored.
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            file: "1699764243_created_transcodes",
            up: m1699764243_created_transcodes::up,
            down: m1699764243_created_transcodes::down,
        },
        Migration {
            file: "1699764454_updated_transcodes",
            up: m1699764454_updated_transcodes::up,
            down: m1699764454_updated_transcodes::down,
        },
        Migration {
            file: "1699764494_created_settings",
            up: m1699764494_created_settings::up,
            down: m1699764494_created_settings::down,
        },
    ]
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {file} failed: {source}")]
    Failed {
        file: &'static str,
        #[source]
        source: SchemaError,
    },

    #[error("applied migration {0} is unknown to this build")]
    Unknown(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub file: &'static str,
    pub system: bool,
    pub applied: bool,
}

pub struct Migrator {
    store: Arc<dyn Store>,
    system: Vec<Migration>,
    migrations: Vec<Migration>,
}

impl Migrator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_migrations(store, system::migrations(), migrations())
    }

    pub fn with_migrations(store: Arc<dyn Store>, system: Vec<Migration>, mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|m| m.file);
        Self {
            store,
            system,
            migrations,
        }
    }

    /// Applies every pending migration, system ones first. Stops at the
    /// first failure; earlier steps stay applied.
    pub async fn up(&self) -> Result<Vec<&'static str>, MigrationError> {
        let applied = self.store.applied_migrations().await?;
        let mut done = Vec::new();

        for migration in self.system.iter().chain(self.migrations.iter()) {
            if applied.iter().any(|f| f == migration.file) {
                continue;
            }
            self.run(migration, Direction::Up).await?;
            info!(file = migration.file, "Applied migration");
            done.push(migration.file);
        }

        if done.is_empty() {
            debug!("No pending migrations");
        }
        Ok(done)
    }

    /// Reverts the last `count` applied application migrations, newest
    /// first. System migrations are never reverted.
    pub async fn down(&self, count: usize) -> Result<Vec<&'static str>, MigrationError> {
        let applied = self.store.applied_migrations().await?;
        let mut done = Vec::new();

        let candidates = applied
            .iter()
            .rev()
            .filter(|file| !self.system.iter().any(|m| m.file == file.as_str()))
            .take(count);

        for file in candidates {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.file == file.as_str())
                .ok_or_else(|| MigrationError::Unknown(file.clone()))?;
            self.run(migration, Direction::Down).await?;
            info!(file = migration.file, "Reverted migration");
            done.push(migration.file);
        }
        Ok(done)
    }

    pub async fn status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        let applied = self.store.applied_migrations().await?;
        let system = self.system.iter().map(|m| (m, true));
        let app = self.migrations.iter().map(|m| (m, false));
        Ok(system
            .chain(app)
            .map(|(m, system)| MigrationStatus {
                file: m.file,
                system,
                applied: applied.iter().any(|f| f == m.file),
            })
            .collect())
    }

    async fn run(&self, migration: &Migration, direction: Direction) -> Result<(), MigrationError> {
        let current = Schemas::from_collections(self.store.list_collections().await?);
        let mut next = current.clone();

        let step = match direction {
            Direction::Up => migration.up,
            Direction::Down => migration.down,
        };
        step(&mut next).map_err(|source| MigrationError::Failed {
            file: migration.file,
            source,
        })?;

        let changes = current.diff(&next);
        debug!(
            file = migration.file,
            saved = changes.saved.len(),
            deleted = changes.deleted.len(),
            renamed = changes.renamed.len(),
            "Migration step computed"
        );
        self.store
            .commit_migration(MigrationCommit {
                file: migration.file.to_string(),
                direction,
                saved: changes.saved,
                deleted: changes.deleted,
                renamed: changes.renamed,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::MemoryStore;
    use crate::modules::records::model::Record;
    use crate::schema::{Collection, FieldKind, RuleKind, TRANSCODES_COLLECTION};

    async fn snapshot(store: &Arc<dyn Store>) -> serde_json::Value {
        serde_json::to_value(Schemas::from_collections(store.list_collections().await.unwrap())).unwrap()
    }

    fn first_n(n: usize) -> Vec<Migration> {
        migrations().into_iter().take(n).collect()
    }

    #[tokio::test]
    async fn updated_transcodes_down_restores_created_state() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

        Migrator::with_migrations(store.clone(), system::migrations(), first_n(1))
            .up()
            .await
            .unwrap();
        let after_first = snapshot(&store).await;

        let migrator = Migrator::with_migrations(store.clone(), system::migrations(), first_n(2));
        assert_eq!(migrator.up().await.unwrap(), vec!["1699764454_updated_transcodes"]);
        assert_ne!(snapshot(&store).await, after_first);

        assert_eq!(migrator.down(1).await.unwrap(), vec!["1699764454_updated_transcodes"]);
        assert_eq!(snapshot(&store).await, after_first);

        let transcodes = store.find_collection(TRANSCODES_COLLECTION).await.unwrap().unwrap();
        let names: Vec<_> = transcodes.schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["file_name", "profiles", "field"]);
        assert_eq!(transcodes.schema.get_by_id("xlojdfpl").unwrap().name, "field");
        for kind in RuleKind::ALL {
            assert_eq!(transcodes.rule(kind), None);
        }
    }

    #[tokio::test]
    async fn renamed_owner_field_keeps_existing_record_data() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Migrator::with_migrations(store.clone(), system::migrations(), first_n(1))
            .up()
            .await
            .unwrap();

        let transcodes = store.find_collection(TRANSCODES_COLLECTION).await.unwrap().unwrap();
        let mut data = serde_json::Map::new();
        data.insert("file_name".into(), serde_json::json!("clip.mp4"));
        data.insert("field".into(), serde_json::json!("u1"));
        let record = Record::new(&transcodes.id, data);
        store.insert_record(&record).await.unwrap();

        let migrator = Migrator::with_migrations(store.clone(), system::migrations(), first_n(2));
        migrator.up().await.unwrap();
        let transcodes = store.find_collection(TRANSCODES_COLLECTION).await.unwrap().unwrap();
        let stored = store.find_record(&transcodes.id, &record.id).await.unwrap().unwrap();
        assert_eq!(stored.export(&transcodes)["user"], "u1");
        assert!(!stored.data.contains_key("field"));

        migrator.down(1).await.unwrap();
        let stored = store.find_record(&transcodes.id, &record.id).await.unwrap().unwrap();
        assert_eq!(stored.data["field"], "u1");
        assert!(!stored.data.contains_key("user"));
    }

    #[tokio::test]
    async fn full_run_declares_owner_scoped_collections() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let migrator = Migrator::new(store.clone());
        let applied = migrator.up().await.unwrap();
        assert_eq!(
            applied,
            vec![
                "1640988000_init_users",
                "1699764243_created_transcodes",
                "1699764454_updated_transcodes",
                "1699764494_created_settings",
            ]
        );

        for name in ["transcodes", "settings"] {
            let collection: Collection = store.find_collection(name).await.unwrap().unwrap();
            for kind in RuleKind::ALL {
                assert_eq!(
                    collection.rule(kind),
                    Some("@request.auth.id != \"\" && user = @request.auth.id")
                );
            }
            let user = collection.schema.get_by_name("user").unwrap();
            assert!(matches!(&user.kind, FieldKind::Relation(o) if o.collection_id == "_pb_users_auth_"));
        }

        let transcodes = store.find_collection("transcodes").await.unwrap().unwrap();
        let status = transcodes.schema.get_by_name("status").unwrap();
        assert!(matches!(&status.kind, FieldKind::Select(o) if o.values == ["in_progress", "complete", "error"]));
    }

    #[tokio::test]
    async fn up_is_idempotent_and_down_then_up_round_trips() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let migrator = Migrator::new(store.clone());
        migrator.up().await.unwrap();
        let full = snapshot(&store).await;

        assert!(migrator.up().await.unwrap().is_empty());

        let reverted = migrator.down(3).await.unwrap();
        assert_eq!(
            reverted,
            vec![
                "1699764494_created_settings",
                "1699764454_updated_transcodes",
                "1699764243_created_transcodes",
            ]
        );
        let names: Vec<_> = store.list_collections().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["users".to_string()]);

        // the system migration stays applied
        assert!(migrator.down(5).await.unwrap().is_empty());

        migrator.up().await.unwrap();
        assert_eq!(snapshot(&store).await, full);

        let status = migrator.status().await.unwrap();
        assert_eq!(status.len(), 4);
        assert!(status.iter().all(|s| s.applied));
        assert!(status[0].system);
    }

    fn broken_up(schemas: &mut Schemas) -> Result<(), SchemaError> {
        let mut collection = schemas.find_collection_by_name_or_id("transcodes")?.clone();
        collection.schema.remove_field("not-a-field")?;
        schemas.save_collection(collection)
    }

    fn noop(_: &mut Schemas) -> Result<(), SchemaError> {
        Ok(())
    }

    #[tokio::test]
    async fn failed_migration_leaves_store_untouched() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut list = first_n(1);
        list.push(Migration {
            file: "1699999999_broken",
            up: broken_up,
            down: noop,
        });
        let migrator = Migrator::with_migrations(store.clone(), system::migrations(), list);

        let err = migrator.up().await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Failed {
                file: "1699999999_broken",
                source: SchemaError::FieldNotFound(_)
            }
        ));

        let applied = store.applied_migrations().await.unwrap();
        assert_eq!(applied, vec!["1640988000_init_users", "1699764243_created_transcodes"]);
    }

    #[tokio::test]
    async fn unknown_applied_migration_is_reported() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Migrator::new(store.clone()).up().await.unwrap();

        let older_build = Migrator::with_migrations(store.clone(), system::migrations(), first_n(2));
        assert!(matches!(
            older_build.down(1).await,
            Err(MigrationError::Unknown(file)) if file == "1699764494_created_settings"
        ));
    }
}
