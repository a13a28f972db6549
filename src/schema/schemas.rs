use std::collections::BTreeMap;

use serde::Serialize;

use super::SchemaError;
use super::collection::Collection;
use super::field::FieldKind;

/// The set of collection definitions a migration reads and edits.
///
/// Migrations run against an in-memory copy; the difference with the
/// stored state is what gets persisted (see [`Schemas::diff`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schemas {
    collections: BTreeMap<String, Collection>,
}

/// A field kept by id but given a new name. Record data is keyed by
/// name, so stored values move with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRename {
    pub collection_id: String,
    pub from: String,
    pub to: String,
}

/// Collections to upsert, collection ids to drop and field renames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaChanges {
    pub saved: Vec<Collection>,
    pub deleted: Vec<String>,
    pub renamed: Vec<FieldRename>,
}

impl SchemaChanges {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.deleted.is_empty() && self.renamed.is_empty()
    }
}

impl Schemas {
    pub fn from_collections(collections: impl IntoIterator<Item = Collection>) -> Self {
        Self {
            collections: collections.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn find_collection_by_name_or_id(&self, key: &str) -> Result<&Collection, SchemaError> {
        self.collections
            .get(key)
            .or_else(|| {
                self.collections
                    .values()
                    .find(|c| c.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| SchemaError::CollectionNotFound(key.to_string()))
    }

    /// Inserts or replaces a collection after validating it against the
    /// rest of the set.
    pub fn save_collection(&mut self, collection: Collection) -> Result<(), SchemaError> {
        collection.validate()?;

        if let Some(other) = self
            .collections
            .values()
            .find(|c| c.id != collection.id && c.name.eq_ignore_ascii_case(&collection.name))
        {
            return Err(SchemaError::DuplicateCollection(other.name.clone()));
        }

        for field in collection.schema.fields() {
            if let FieldKind::Relation(options) = &field.kind {
                let target_known = options.collection_id == collection.id
                    || self.collections.contains_key(&options.collection_id);
                if !target_known {
                    return Err(SchemaError::Invalid {
                        collection: collection.name.clone(),
                        reason: format!(
                            "relation field {:?} targets unknown collection {:?}",
                            field.name, options.collection_id
                        ),
                    });
                }
            }
        }

        self.collections.insert(collection.id.clone(), collection);
        Ok(())
    }

    pub fn delete_collection(&mut self, key: &str) -> Result<Collection, SchemaError> {
        let collection = self.find_collection_by_name_or_id(key)?;
        if collection.system {
            return Err(SchemaError::SystemCollection(collection.name.clone()));
        }

        let id = collection.id.clone();
        let name = collection.name.clone();
        if let Some(referrer) = self.collections.values().find(|c| {
            c.id != id
                && c.schema.fields().iter().any(|f| {
                    matches!(&f.kind, FieldKind::Relation(o) if o.collection_id == id)
                })
        }) {
            return Err(SchemaError::CollectionInUse(name, referrer.name.clone()));
        }

        self.collections
            .remove(&id)
            .ok_or(SchemaError::CollectionNotFound(id))
    }

    /// What has to be written to turn `self` into `after`.
    pub fn diff(&self, after: &Schemas) -> SchemaChanges {
        let saved = after
            .collections
            .iter()
            .filter(|(id, c)| self.collections.get(*id) != Some(*c))
            .map(|(_, c)| c.clone())
            .collect();
        let deleted = self
            .collections
            .keys()
            .filter(|id| !after.collections.contains_key(*id))
            .cloned()
            .collect();
        let renamed = after
            .collections
            .values()
            .filter_map(|c| self.collections.get(&c.id).map(|before| (before, c)))
            .flat_map(|(before, c)| {
                c.schema.fields().iter().filter_map(move |field| {
                    let old = before.schema.get_by_id(&field.id)?;
                    (old.name != field.name).then(|| FieldRename {
                        collection_id: c.id.clone(),
                        from: old.name.clone(),
                        to: field.name.clone(),
                    })
                })
            })
            .collect();
        SchemaChanges {
            saved,
            deleted,
            renamed,
        }
    }
}
