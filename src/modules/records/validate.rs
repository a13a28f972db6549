use regex::Regex;
use serde_json::{Map, Value};

use super::error::RecordError;
use super::model::Record;
use crate::infrastructure::store::Store;
use crate::schema::{Collection, FieldKind, RelationOptions, SchemaField, SelectOptions, TextOptions};

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn invalid(field: &SchemaField, reason: impl Into<String>) -> RecordError {
    RecordError::Validation {
        field: field.name.clone(),
        reason: reason.into(),
    }
}

/// Merges `input` over the existing record data (if any) and checks the
/// result against the collection schema. Unknown keys are dropped.
pub async fn prepare_data(
    store: &dyn Store,
    collection: &Collection,
    existing: Option<&Record>,
    input: &Map<String, Value>,
) -> Result<Map<String, Value>, RecordError> {
    let mut data = existing.map(|r| r.data.clone()).unwrap_or_default();

    for field in collection.schema.fields() {
        let Some(value) = input.get(&field.name) else {
            continue;
        };
        let value = normalize(field, value)?;
        data.insert(field.name.clone(), value);
    }

    for field in collection.schema.fields() {
        let value = data.get(&field.name).cloned().unwrap_or(Value::Null);

        if field.required && is_empty(&value) {
            return Err(invalid(field, "cannot be blank"));
        }
        if is_empty(&value) {
            continue;
        }

        if let FieldKind::Relation(options) = &field.kind {
            check_relation_targets(store, field, options, &value).await?;
        }

        if field.unique {
            let clashes = store
                .find_records_by_field(&collection.id, &field.name, &value)
                .await?;
            let own_id = existing.map(|r| r.id.as_str());
            if clashes.iter().any(|r| Some(r.id.as_str()) != own_id) {
                return Err(invalid(field, "value must be unique"));
            }
        }
    }

    Ok(data)
}

fn normalize(field: &SchemaField, value: &Value) -> Result<Value, RecordError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match &field.kind {
        FieldKind::Json(_) => Ok(value.clone()),
        FieldKind::Text(options) => normalize_text(field, options, value),
        FieldKind::Select(options) => normalize_select(field, options, value),
        FieldKind::Relation(options) => normalize_relation(field, options, value),
    }
}

fn normalize_text(field: &SchemaField, options: &TextOptions, value: &Value) -> Result<Value, RecordError> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(invalid(field, "must be a string")),
    };
    if text.is_empty() {
        return Ok(Value::String(text));
    }

    let len = text.chars().count() as u32;
    if let Some(min) = options.min {
        if len < min {
            return Err(invalid(field, format!("must be at least {} characters", min)));
        }
    }
    if let Some(max) = options.max {
        if len > max {
            return Err(invalid(field, format!("must be at most {} characters", max)));
        }
    }
    if !options.pattern.is_empty() {
        let re = Regex::new(&options.pattern).map_err(|e| invalid(field, format!("bad pattern: {}", e)))?;
        if !re.is_match(&text) {
            return Err(invalid(field, "invalid format"));
        }
    }
    Ok(Value::String(text))
}

fn string_items(field: &SchemaField, value: &Value) -> Result<Vec<String>, RecordError> {
    match value {
        Value::String(s) if s.is_empty() => Ok(vec![]),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(field, "values must be strings"))
            })
            .collect(),
        _ => Err(invalid(field, "must be a string or a list of strings")),
    }
}

fn shape(items: Vec<String>, single: bool) -> Value {
    if single {
        items.into_iter().next().map(Value::String).unwrap_or(Value::Null)
    } else {
        Value::Array(items.into_iter().map(Value::String).collect())
    }
}

fn normalize_select(field: &SchemaField, options: &SelectOptions, value: &Value) -> Result<Value, RecordError> {
    let items = string_items(field, value)?;
    if items.len() > options.max_select.max(1) as usize {
        return Err(invalid(field, format!("select at most {} values", options.max_select)));
    }
    if let Some(bad) = items.iter().find(|v| !options.values.contains(v)) {
        return Err(invalid(field, format!("{:?} is not one of {:?}", bad, options.values)));
    }
    Ok(shape(items, options.max_select <= 1))
}

fn normalize_relation(field: &SchemaField, options: &RelationOptions, value: &Value) -> Result<Value, RecordError> {
    let items = string_items(field, value)?;
    if let Some(max) = options.max_select {
        if items.len() > max as usize {
            return Err(invalid(field, format!("select at most {} records", max)));
        }
    }
    if let Some(min) = options.min_select {
        if !items.is_empty() && items.len() < min as usize {
            return Err(invalid(field, format!("select at least {} records", min)));
        }
    }
    Ok(shape(items, options.is_single()))
}

async fn check_relation_targets(
    store: &dyn Store,
    field: &SchemaField,
    options: &RelationOptions,
    value: &Value,
) -> Result<(), RecordError> {
    let ids = string_items(field, value)?;
    for id in ids {
        if store.find_record(&options.collection_id, &id).await?.is_none() {
            return Err(invalid(field, format!("related record {} not found", id)));
        }
    }
    Ok(())
}
