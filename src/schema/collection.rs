use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SchemaError;
use super::field::{FieldKind, SchemaField};
use crate::rules::{Access, SYSTEM_FIELDS};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").expect("valid name regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    Base,
    Auth,
}

/// The five per-operation access rules of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    List,
    View,
    Create,
    Update,
    Delete,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::List,
        RuleKind::View,
        RuleKind::Create,
        RuleKind::Update,
        RuleKind::Delete,
    ];
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::List => "listRule",
            RuleKind::View => "viewRule",
            RuleKind::Create => "createRule",
            RuleKind::Update => "updateRule",
            RuleKind::Delete => "deleteRule",
        };
        f.write_str(name)
    }
}

/// Ordered list of fields. Field ids are stable across renames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Vec<SchemaField>);

impl Schema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.0
    }

    /// Replaces the field with the same id in place, or appends it.
    pub fn add_field(&mut self, field: SchemaField) {
        match self.0.iter_mut().find(|f| f.id == field.id) {
            Some(existing) => *existing = field,
            None => self.0.push(field),
        }
    }

    pub fn remove_field(&mut self, id: &str) -> Result<SchemaField, SchemaError> {
        let pos = self
            .0
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| SchemaError::FieldNotFound(id.to_string()))?;
        Ok(self.0.remove(pos))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&SchemaField> {
        self.0.iter().find(|f| f.id == id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&SchemaField> {
        self.0.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub created: String,
    pub updated: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CollectionType,
    pub system: bool,
    pub schema: Schema,
    pub indexes: Vec<String>,
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
    pub options: Map<String, Value>,
}

impl Collection {
    /// A base collection with no fields and every rule locked.
    pub fn base(id: &str, name: &str, timestamp: &str) -> Self {
        Self {
            id: id.to_string(),
            created: timestamp.to_string(),
            updated: timestamp.to_string(),
            name: name.to_string(),
            kind: CollectionType::Base,
            system: false,
            schema: Schema::default(),
            indexes: Vec::new(),
            list_rule: None,
            view_rule: None,
            create_rule: None,
            update_rule: None,
            delete_rule: None,
            options: Map::new(),
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind == CollectionType::Auth
    }

    pub fn rule(&self, kind: RuleKind) -> Option<&str> {
        match kind {
            RuleKind::List => self.list_rule.as_deref(),
            RuleKind::View => self.view_rule.as_deref(),
            RuleKind::Create => self.create_rule.as_deref(),
            RuleKind::Update => self.update_rule.as_deref(),
            RuleKind::Delete => self.delete_rule.as_deref(),
        }
    }

    pub fn set_rule(&mut self, kind: RuleKind, rule: Option<&str>) {
        let rule = rule.map(str::to_string);
        match kind {
            RuleKind::List => self.list_rule = rule,
            RuleKind::View => self.view_rule = rule,
            RuleKind::Create => self.create_rule = rule,
            RuleKind::Update => self.update_rule = rule,
            RuleKind::Delete => self.delete_rule = rule,
        }
    }

    pub fn set_all_rules(&mut self, rule: Option<&str>) {
        for kind in RuleKind::ALL {
            self.set_rule(kind, rule);
        }
    }

    pub fn access(&self, kind: RuleKind) -> Result<Access, SchemaError> {
        Access::from_rule(self.rule(kind)).map_err(|source| SchemaError::Rule {
            collection: self.name.clone(),
            kind,
            source,
        })
    }

    /// Checks the collection on its own: names, field uniqueness, options
    /// and rule syntax. Cross-collection checks live in [`super::Schemas`].
    pub fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |reason: String| SchemaError::Invalid {
            collection: self.name.clone(),
            reason,
        };

        if self.id.is_empty() {
            return Err(invalid("id must not be empty".into()));
        }
        if !NAME_RE.is_match(&self.name) {
            return Err(invalid(format!("invalid collection name {:?}", self.name)));
        }

        let fields = self.schema.fields();
        for (i, field) in fields.iter().enumerate() {
            if field.id.is_empty() {
                return Err(invalid(format!("field {:?} has an empty id", field.name)));
            }
            if !NAME_RE.is_match(&field.name) {
                return Err(invalid(format!("invalid field name {:?}", field.name)));
            }
            if SYSTEM_FIELDS.contains(&field.name.as_str()) {
                return Err(invalid(format!("field name {:?} is reserved", field.name)));
            }
            if fields[..i].iter().any(|f| f.id == field.id) {
                return Err(invalid(format!("duplicate field id {:?}", field.id)));
            }
            if fields[..i].iter().any(|f| f.name.eq_ignore_ascii_case(&field.name)) {
                return Err(invalid(format!("duplicate field name {:?}", field.name)));
            }
            match &field.kind {
                FieldKind::Select(options) if options.values.is_empty() => {
                    return Err(invalid(format!("select field {:?} has no values", field.name)));
                }
                FieldKind::Text(options) if !options.pattern.is_empty() => {
                    Regex::new(&options.pattern).map_err(|e| {
                        invalid(format!("invalid pattern on field {:?}: {}", field.name, e))
                    })?;
                }
                FieldKind::Relation(options) if options.collection_id.is_empty() => {
                    return Err(invalid(format!("relation field {:?} has no target", field.name)));
                }
                _ => {}
            }
        }

        for kind in RuleKind::ALL {
            if let Access::Expr(rule) = self.access(kind)? {
                for name in rule.field_refs() {
                    if !SYSTEM_FIELDS.contains(&name) && self.schema.get_by_name(name).is_none() {
                        return Err(invalid(format!("{} references unknown field {:?}", kind, name)));
                    }
                }
            }
        }

        Ok(())
    }
}
