use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::modules::records::model::{Record, format_time};

pub const FILE_NAME_FIELD: &str = "file_name";
pub const PROFILES_FIELD: &str = "profiles";
pub const STATUS_FIELD: &str = "status";
pub const STATUS_MESSAGE_FIELD: &str = "status_message";
pub const SETTINGS_FIELD: &str = "settings";
pub const OWNER_FIELD: &str = "user";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeStatus {
    InProgress,
    Complete,
    Error,
}

impl TranscodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscodeStatus::InProgress => "in_progress",
            TranscodeStatus::Complete => "complete",
            TranscodeStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Transcode {
    pub id: String,
    pub file_name: String,
    #[schema(value_type = Object)]
    pub profiles: Value,
    pub user: Option<String>,
    pub status: Option<TranscodeStatus>,
    pub status_message: String,
    pub created: String,
    pub updated: String,
}

impl Transcode {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            file_name: record.get_str(FILE_NAME_FIELD).unwrap_or_default().to_string(),
            profiles: record.get(PROFILES_FIELD).cloned().unwrap_or(Value::Null),
            user: record.get_str(OWNER_FIELD).map(str::to_string),
            status: record
                .get(STATUS_FIELD)
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            status_message: record.get_str(STATUS_MESSAGE_FIELD).unwrap_or_default().to_string(),
            created: format_time(record.created),
            updated: format_time(record.updated),
        }
    }
}

/// Per-user settings document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSettings {
    pub id: String,
    #[schema(value_type = Object)]
    pub settings: Value,
    pub user: String,
    pub updated: String,
}

impl UserSettings {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            settings: record.get(SETTINGS_FIELD).cloned().unwrap_or(Value::Null),
            user: record.get_str(OWNER_FIELD).unwrap_or_default().to_string(),
            updated: format_time(record.updated),
        }
    }
}
