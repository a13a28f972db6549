use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::common::response::ApiError;
use crate::modules::records::error::RecordError;

/// Failures the caller can fix. Anything else out of the auth flow is a
/// server fault.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Maps an auth service failure onto the response envelope.
pub fn api_error(err: anyhow::Error) -> ApiError {
    if let Some(auth) = err.downcast_ref::<AuthError>() {
        return ApiError(auth.to_string(), auth.status_code());
    }
    match err.downcast::<RecordError>() {
        Ok(record) => record.into(),
        Err(err) => {
            error!("Auth operation failed: {:#}", err);
            ApiError("Internal Server Error".to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
