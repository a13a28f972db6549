use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::model::TranscodeStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: TranscodeStatus,
    pub status_message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingsRequest {
    #[schema(value_type = Object)]
    pub settings: Value,
}
