use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::common::id::new_record_id;
use crate::schema::Collection;

/// A stored row of any collection. Field values live in `data`, keyed by
/// field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub collection_id: String,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(collection_id: &str, data: Map<String, Value>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: new_record_id(),
            collection_id: collection_id.to_string(),
            created: now,
            updated: now,
            data,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// The flat view rule expressions are evaluated against.
    pub fn rule_view(&self, collection: &Collection) -> Map<String, Value> {
        let mut view = self.data.clone();
        view.insert("id".into(), Value::String(self.id.clone()));
        view.insert("collectionId".into(), Value::String(collection.id.clone()));
        view.insert("collectionName".into(), Value::String(collection.name.clone()));
        view.insert("created".into(), Value::String(format_time(self.created)));
        view.insert("updated".into(), Value::String(format_time(self.updated)));
        view
    }

    /// API representation: system fields first, then every declared field
    /// that is not hidden.
    pub fn export(&self, collection: &Collection) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), Value::String(self.id.clone()));
        out.insert("collectionId".into(), Value::String(collection.id.clone()));
        out.insert("collectionName".into(), Value::String(collection.name.clone()));
        out.insert("created".into(), Value::String(format_time(self.created)));
        out.insert("updated".into(), Value::String(format_time(self.updated)));
        for field in collection.schema.fields().iter().filter(|f| !f.hidden) {
            let value = self.data.get(&field.name).cloned().unwrap_or(Value::Null);
            out.insert(field.name.clone(), value);
        }
        Value::Object(out)
    }
}

pub fn format_time(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}
