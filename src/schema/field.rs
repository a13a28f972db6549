use serde::{Deserialize, Serialize};

/// A single column of a collection schema.
///
/// The serialized shape is the one the admin UI and migration files use:
/// `type` and `options` sit next to the flags, option keys are camelCase and
/// unset limits are written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub system: bool,
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    pub presentable: bool,
    pub unique: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum FieldKind {
    Text(TextOptions),
    Json(JsonOptions),
    Relation(RelationOptions),
    Select(SelectOptions),
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "text",
            FieldKind::Json(_) => "json",
            FieldKind::Relation(_) => "relation",
            FieldKind::Select(_) => "select",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    pub min: Option<u32>,
    pub max: Option<u32>,
    #[serde(default)]
    pub pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonOptions {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationOptions {
    pub collection_id: String,
    pub cascade_delete: bool,
    pub min_select: Option<u32>,
    pub max_select: Option<u32>,
    pub display_fields: Option<Vec<String>>,
}

impl RelationOptions {
    /// A relation to at most one record of `collection_id`.
    pub fn single(collection_id: &str) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            cascade_delete: false,
            min_select: None,
            max_select: Some(1),
            display_fields: None,
        }
    }

    pub fn is_single(&self) -> bool {
        self.max_select == Some(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptions {
    pub max_select: u32,
    pub values: Vec<String>,
}

impl SelectOptions {
    pub fn single(values: &[&str]) -> Self {
        Self {
            max_select: 1,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl SchemaField {
    /// A non-system, optional, non-unique field.
    pub fn new(id: &str, name: &str, kind: FieldKind) -> Self {
        Self {
            system: false,
            id: id.to_string(),
            name: name.to_string(),
            kind,
            required: false,
            presentable: false,
            unique: false,
            hidden: false,
        }
    }

    pub fn text(id: &str, name: &str) -> Self {
        Self::new(id, name, FieldKind::Text(TextOptions::default()))
    }

    pub fn json(id: &str, name: &str) -> Self {
        Self::new(id, name, FieldKind::Json(JsonOptions {}))
    }

    pub fn relation(id: &str, name: &str, options: RelationOptions) -> Self {
        Self::new(id, name, FieldKind::Relation(options))
    }

    pub fn select(id: &str, name: &str, options: SelectOptions) -> Self {
        Self::new(id, name, FieldKind::Select(options))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relation_field_serializes_in_declaration_shape() {
        let field = SchemaField::relation("xlojdfpl", "field", RelationOptions::single("_pb_users_auth_"));

        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "system": false,
                "id": "xlojdfpl",
                "name": "field",
                "type": "relation",
                "required": false,
                "presentable": false,
                "unique": false,
                "options": {
                    "collectionId": "_pb_users_auth_",
                    "cascadeDelete": false,
                    "minSelect": null,
                    "maxSelect": 1,
                    "displayFields": null
                }
            })
        );
    }

    #[test]
    fn text_field_parses_from_declaration() {
        let field: SchemaField = serde_json::from_value(json!({
            "system": false,
            "id": "y2zg4gvu",
            "name": "status_message",
            "type": "text",
            "required": false,
            "presentable": false,
            "unique": false,
            "options": { "min": null, "max": null, "pattern": "" }
        }))
        .unwrap();

        assert_eq!(field, SchemaField::text("y2zg4gvu", "status_message"));
        assert!(!field.hidden);
    }

    #[test]
    fn json_field_has_empty_options_object() {
        let value = serde_json::to_value(SchemaField::json("emyxrjdg", "profiles")).unwrap();
        assert_eq!(value["type"], "json");
        assert_eq!(value["options"], json!({}));
    }
}
