//! Loading record endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        loading_record::{CreateLoadingRecord, ProgressUpdate, UpdateLoadingRecord},
        LoadingRecord, ProgressView,
    },
};

use super::{ApiJson, ApiResponse, RecordId};

/// Register a vehicle on a dock
#[utoipa::path(
    post,
    path = "/loading-records",
    tag = "loading-records",
    request_body = CreateLoadingRecord,
    responses(
        (status = 201, description = "Record created", body = LoadingRecord),
        (status = 400, description = "Invalid data or dock in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_record(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<CreateLoadingRecord>,
) -> AppResult<(StatusCode, Json<ApiResponse<LoadingRecord>>)> {
    let record = state.services.loading_records.create(data).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Loading record created", record),
    ))
}

/// List all records ordered by dock
#[utoipa::path(
    get,
    path = "/loading-records",
    tag = "loading-records",
    responses(
        (status = 200, description = "Records list", body = Vec<LoadingRecord>)
    )
)]
pub async fn list_records(
    State(state): State<crate::AppState>,
) -> AppResult<Json<ApiResponse<Vec<LoadingRecord>>>> {
    let records = state.services.loading_records.list().await?;
    Ok(ApiResponse::ok(records))
}

/// Get record by ID
#[utoipa::path(
    get,
    path = "/loading-records/{id}",
    tag = "loading-records",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    responses(
        (status = 200, description = "Record details", body = LoadingRecord),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_record(
    State(state): State<crate::AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<ApiResponse<LoadingRecord>>> {
    let record = state.services.loading_records.get(id).await?;
    Ok(ApiResponse::ok(record))
}

/// Update a record (only the fields present are merged)
#[utoipa::path(
    put,
    path = "/loading-records/{id}",
    tag = "loading-records",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    request_body = UpdateLoadingRecord,
    responses(
        (status = 200, description = "Record updated", body = LoadingRecord),
        (status = 400, description = "Invalid data", body = crate::error::ErrorResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_record(
    State(state): State<crate::AppState>,
    RecordId(id): RecordId,
    ApiJson(data): ApiJson<UpdateLoadingRecord>,
) -> AppResult<Json<ApiResponse<LoadingRecord>>> {
    let record = state.services.loading_records.update(id, data).await?;
    Ok(ApiResponse::with_message("Loading record updated", record))
}

/// Push an explicit progress stage
#[utoipa::path(
    put,
    path = "/loading-records/{id}/progress",
    tag = "loading-records",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    request_body = ProgressUpdate,
    responses(
        (status = 200, description = "Progress updated", body = LoadingRecord),
        (status = 400, description = "Percentage out of range or unknown status", body = crate::error::ErrorResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_progress(
    State(state): State<crate::AppState>,
    RecordId(id): RecordId,
    ApiJson(data): ApiJson<ProgressUpdate>,
) -> AppResult<Json<ApiResponse<LoadingRecord>>> {
    let record = state.services.loading_records.update_progress(id, data).await?;
    Ok(ApiResponse::with_message("Progress updated", record))
}

/// Progress projection of a record
#[utoipa::path(
    get,
    path = "/loading-records/{id}/progress",
    tag = "loading-records",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    responses(
        (status = 200, description = "Progress projection", body = ProgressView),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_progress(
    State(state): State<crate::AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<ApiResponse<ProgressView>>> {
    let view = state.services.loading_records.get_progress(id).await?;
    Ok(ApiResponse::ok(view))
}

/// Finalize a record whose schedule is complete
#[utoipa::path(
    post,
    path = "/loading-records/{id}/finalize",
    tag = "loading-records",
    params(("id" = String, Path, description = "Record ID (UUID)")),
    responses(
        (status = 200, description = "Record finalized", body = LoadingRecord),
        (status = 400, description = "Schedule incomplete", body = crate::error::ErrorResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn finalize_record(
    State(state): State<crate::AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<ApiResponse<LoadingRecord>>> {
    let record = state.services.loading_records.finalize(id).await?;
    Ok(ApiResponse::with_message(
        "Loading finalized, vehicle released for departure",
        record,
    ))
}
