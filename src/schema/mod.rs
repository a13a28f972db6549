//! Collection definitions: what records look like and who may touch them.

use thiserror::Error;

use crate::rules::RuleError;

pub mod collection;
pub mod field;
pub mod schemas;

pub use collection::{Collection, CollectionType, RuleKind, Schema};
pub use field::{FieldKind, RelationOptions, SchemaField, SelectOptions, TextOptions};
pub use schemas::{FieldRename, SchemaChanges, Schemas};

pub const USERS_COLLECTION_ID: &str = "_pb_users_auth_";
pub const USERS_COLLECTION: &str = "users";
pub const TRANSCODES_COLLECTION: &str = "transcodes";
pub const SETTINGS_COLLECTION: &str = "settings";

/// Rule shared by every owner-scoped collection.
pub const OWNER_RULE: &str = "@request.auth.id != \"\" && user = @request.auth.id";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("collection name already in use: {0}")]
    DuplicateCollection(String),

    #[error("collection {0} is referenced by {1}")]
    CollectionInUse(String, String),

    #[error("system collection {0} cannot be deleted")]
    SystemCollection(String),

    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("invalid collection {collection}: {reason}")]
    Invalid { collection: String, reason: String },

    #[error("invalid {kind} on {collection}: {source}")]
    Rule {
        collection: String,
        kind: RuleKind,
        #[source]
        source: RuleError,
    },
}
