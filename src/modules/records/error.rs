use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::common::response::ApiError;
use crate::infrastructure::store::StoreError;
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Record not found")]
    NotFound,

    #[error("Only admins can perform this action")]
    AdminOnly,

    #[error("You are not allowed to perform this request")]
    Forbidden,

    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecordError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecordError::CollectionNotFound(_) | RecordError::NotFound => StatusCode::NOT_FOUND,
            RecordError::AdminOnly | RecordError::Forbidden => StatusCode::FORBIDDEN,
            RecordError::Validation { .. } | RecordError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RecordError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            RecordError::Store(StoreError::Conflict(_)) => StatusCode::BAD_REQUEST,
            RecordError::Schema(_) | RecordError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        let status = err.status_code();
        if status.is_server_error() {
            error!("Record operation failed: {}", err);
            return ApiError("Internal Server Error".to_string(), status);
        }
        ApiError(err.to_string(), status)
    }
}
