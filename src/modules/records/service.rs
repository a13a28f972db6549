use std::collections::HashSet;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::error::RecordError;
use super::model::Record;
use super::validate::prepare_data;
use crate::rules::{Access, AuthContext, RuleContext};
use crate::schema::{Collection, FieldKind, RuleKind};
use crate::state::AppState;

pub struct RecordService;

impl RecordService {
    pub async fn collection(state: &AppState, name_or_id: &str) -> Result<Collection, RecordError> {
        state
            .store
            .find_collection(name_or_id)
            .await?
            .ok_or_else(|| RecordError::CollectionNotFound(name_or_id.to_string()))
    }

    /// Every record of the collection the caller may list, oldest first.
    pub async fn list_all(
        state: &AppState,
        auth: &AuthContext,
        collection: &Collection,
    ) -> Result<Vec<Record>, RecordError> {
        let access = Self::access(auth, collection, RuleKind::List)?;
        let empty = Map::new();

        let records = state.store.list_records(&collection.id).await?;
        Ok(records
            .into_iter()
            .filter(|record| {
                let view = record.rule_view(collection);
                access.allows(&RuleContext {
                    auth,
                    record: &view,
                    data: &empty,
                })
            })
            .collect())
    }

    pub async fn view(
        state: &AppState,
        auth: &AuthContext,
        collection: &Collection,
        id: &str,
    ) -> Result<Record, RecordError> {
        let access = Self::access(auth, collection, RuleKind::View)?;
        let record = Self::find_raw(state, collection, id).await?;

        // records the caller may not see are reported as missing
        if !access.allows(&RuleContext {
            auth,
            record: &record.rule_view(collection),
            data: &Map::new(),
        }) {
            return Err(RecordError::NotFound);
        }
        Ok(record)
    }

    pub async fn create(
        state: &AppState,
        auth: &AuthContext,
        collection: &Collection,
        input: &Map<String, Value>,
    ) -> Result<Record, RecordError> {
        Self::reject_auth_collection(collection)?;
        let access = Self::access(auth, collection, RuleKind::Create)?;

        let data = prepare_data(state.store.as_ref(), collection, None, input).await?;
        let record = Record::new(&collection.id, data);

        if !access.allows(&RuleContext {
            auth,
            record: &record.rule_view(collection),
            data: input,
        }) {
            return Err(RecordError::Forbidden);
        }

        state.store.insert_record(&record).await?;
        info!(collection = %collection.name, id = %record.id, "Record created");
        Ok(record)
    }

    /// Creates a record without consulting the create rule. Used by the
    /// auth flow to register users.
    pub async fn insert_trusted(
        state: &AppState,
        collection: &Collection,
        input: &Map<String, Value>,
    ) -> Result<Record, RecordError> {
        let data = prepare_data(state.store.as_ref(), collection, None, input).await?;
        let record = Record::new(&collection.id, data);
        state.store.insert_record(&record).await?;
        Ok(record)
    }

    /// Partial update. The rule has to hold for the stored record and for
    /// the merged result.
    pub async fn update(
        state: &AppState,
        auth: &AuthContext,
        collection: &Collection,
        id: &str,
        input: &Map<String, Value>,
    ) -> Result<Record, RecordError> {
        Self::reject_auth_collection(collection)?;
        let access = Self::access(auth, collection, RuleKind::Update)?;
        let existing = Self::find_raw(state, collection, id).await?;

        if !access.allows(&RuleContext {
            auth,
            record: &existing.rule_view(collection),
            data: input,
        }) {
            return Err(RecordError::NotFound);
        }

        let data = prepare_data(state.store.as_ref(), collection, Some(&existing), input).await?;
        let mut updated = existing;
        updated.data = data;
        updated.updated = OffsetDateTime::now_utc();

        if !access.allows(&RuleContext {
            auth,
            record: &updated.rule_view(collection),
            data: input,
        }) {
            return Err(RecordError::Forbidden);
        }

        state.store.update_record(&updated).await?;
        debug!(collection = %collection.name, id = %updated.id, "Record updated");
        Ok(updated)
    }

    pub async fn delete(
        state: &AppState,
        auth: &AuthContext,
        collection: &Collection,
        id: &str,
    ) -> Result<(), RecordError> {
        let access = Self::access(auth, collection, RuleKind::Delete)?;
        let record = Self::find_raw(state, collection, id).await?;

        if !access.allows(&RuleContext {
            auth,
            record: &record.rule_view(collection),
            data: &Map::new(),
        }) {
            return Err(RecordError::NotFound);
        }

        Self::delete_cascading(state, record).await
    }

    /// Deletes `root` and every record reaching it through a relation
    /// marked `cascadeDelete`, transitively.
    async fn delete_cascading(state: &AppState, root: Record) -> Result<(), RecordError> {
        let collections = state.store.list_collections().await?;
        let mut seen = HashSet::new();
        let mut pending = vec![(root.collection_id, root.id)];

        while let Some((collection_id, id)) = pending.pop() {
            if !seen.insert((collection_id.clone(), id.clone())) {
                continue;
            }
            if !state.store.delete_record(&collection_id, &id).await? {
                continue;
            }
            info!(collection = %collection_id, id = %id, "Record deleted");

            for other in &collections {
                for field in other.schema.fields() {
                    let FieldKind::Relation(options) = &field.kind else {
                        continue;
                    };
                    if !options.cascade_delete || options.collection_id != collection_id {
                        continue;
                    }
                    let refs = state
                        .store
                        .find_records_by_field(&other.id, &field.name, &Value::String(id.clone()))
                        .await?;
                    pending.extend(refs.into_iter().map(|r| (r.collection_id, r.id)));
                }
            }
        }
        Ok(())
    }

    async fn find_raw(state: &AppState, collection: &Collection, id: &str) -> Result<Record, RecordError> {
        state
            .store
            .find_record(&collection.id, id)
            .await?
            .ok_or(RecordError::NotFound)
    }

    fn access(auth: &AuthContext, collection: &Collection, kind: RuleKind) -> Result<Access, RecordError> {
        let access = collection.access(kind)?;
        if access == Access::Locked && !auth.is_admin() {
            return Err(RecordError::AdminOnly);
        }
        Ok(access)
    }

    fn reject_auth_collection(collection: &Collection) -> Result<(), RecordError> {
        if collection.is_auth() {
            return Err(RecordError::BadRequest(format!(
                "Records of {} are managed through /api/v1/auth",
                collection.name
            )));
        }
        Ok(())
    }
}
