use super::dto::{SettingsRequest, UpdateStatusRequest};
use super::model::{Transcode, UserSettings};
use super::service::{SettingsService, TranscodeService};
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::rules::AuthContext;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List the caller's transcodes
#[utoipa::path(
    get,
    path = "/api/v1/transcodes",
    responses(
        (status = 200, description = "List of transcodes", body = ApiResponse<Vec<Transcode>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Transcode"
)]
pub async fn list_transcodes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> impl IntoResponse {
    match TranscodeService::list_mine(state, &auth).await {
        Ok(transcodes) => ApiSuccess(
            ApiResponse::success(transcodes, "Transcodes retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Report transcode progress
#[utoipa::path(
    patch,
    path = "/api/v1/transcodes/{id}/status",
    params(
        ("id" = String, Path, description = "Transcode ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Transcode>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Transcode not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Transcode"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    match TranscodeService::update_status(state, &auth, &id, payload).await {
        Ok(transcode) => ApiSuccess(
            ApiResponse::success(transcode, "Status updated successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get the caller's settings
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses(
        (status = 200, description = "Settings, or null when none are saved", body = ApiResponse<UserSettings>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> impl IntoResponse {
    match SettingsService::get(state, &auth).await {
        Ok(settings) => ApiSuccess(
            ApiResponse::success(settings, "Settings retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Save the caller's settings
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = SettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = ApiResponse<UserSettings>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<SettingsRequest>,
) -> impl IntoResponse {
    match SettingsService::put(state, &auth, payload).await {
        Ok(settings) => ApiSuccess(
            ApiResponse::success(settings, "Settings saved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
