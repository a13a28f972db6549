use super::dto::{PageQuery, RecordPage};
use super::error::RecordError;
use super::service::RecordService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::rules::AuthContext;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

fn failure(err: RecordError) -> Response {
    ApiError::from(err).into_response()
}

/// List records of a collection visible to the caller
pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(collection): Path<String>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let collection = match RecordService::collection(&state, &collection).await {
        Ok(c) => c,
        Err(e) => return failure(e),
    };

    match RecordService::list_all(&state, &auth, &collection).await {
        Ok(records) => {
            let items = records.iter().map(|r| r.export(&collection)).collect();
            ApiSuccess(
                ApiResponse::success(RecordPage::slice(items, &query), "Records retrieved successfully"),
                StatusCode::OK,
            )
            .into_response()
        }
        Err(e) => failure(e),
    }
}

pub async fn view_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((collection, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let collection = match RecordService::collection(&state, &collection).await {
        Ok(c) => c,
        Err(e) => return failure(e),
    };

    match RecordService::view(&state, &auth, &collection, &id).await {
        Ok(record) => ApiSuccess(
            ApiResponse::success(record.export(&collection), "Record retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => failure(e),
    }
}

pub async fn create_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(collection): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let collection = match RecordService::collection(&state, &collection).await {
        Ok(c) => c,
        Err(e) => return failure(e),
    };

    match RecordService::create(&state, &auth, &collection, &payload).await {
        Ok(record) => ApiSuccess(
            ApiResponse::success(record.export(&collection), "Record created successfully"),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => failure(e),
    }
}

pub async fn update_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((collection, id)): Path<(String, String)>,
    Json(payload): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let collection = match RecordService::collection(&state, &collection).await {
        Ok(c) => c,
        Err(e) => return failure(e),
    };

    match RecordService::update(&state, &auth, &collection, &id, &payload).await {
        Ok(record) => ApiSuccess(
            ApiResponse::success(record.export(&collection), "Record updated successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => failure(e),
    }
}

pub async fn delete_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((collection, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let collection = match RecordService::collection(&state, &collection).await {
        Ok(c) => c,
        Err(e) => return failure(e),
    };

    match RecordService::delete(&state, &auth, &collection, &id).await {
        Ok(()) => ApiSuccess(ApiResponse::success((), "Record deleted successfully"), StatusCode::OK).into_response(),
        Err(e) => failure(e),
    }
}
