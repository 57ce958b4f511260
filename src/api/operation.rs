//! Overall operation endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        loading_record::CompleteOperationRequest, shift_forecast::DEFAULT_FORECAST, LoadingRecord,
        ShiftCode,
    },
};

use super::{ApiJson, ApiResponse};

/// Completed vehicles against the forecast of the current shift
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationProgress {
    pub total_forecast: i64,
    pub forecast_estimated: bool,
    pub completed: i64,
    /// 0-100
    pub percentage: u8,
    pub pending: i64,
    pub shift: ShiftCode,
    pub last_updated_at: DateTime<Utc>,
}

impl OperationProgress {
    /// Payload served when the figures cannot be read
    pub fn fallback(shift: ShiftCode, at: DateTime<Utc>) -> Self {
        Self {
            total_forecast: DEFAULT_FORECAST,
            forecast_estimated: true,
            completed: 0,
            percentage: 0,
            pending: DEFAULT_FORECAST,
            shift,
            last_updated_at: at,
        }
    }
}

/// Complete a loading record from the operation view
#[utoipa::path(
    post,
    path = "/operation/complete",
    tag = "operation",
    request_body = CompleteOperationRequest,
    responses(
        (status = 200, description = "Record completed", body = LoadingRecord),
        (status = 400, description = "Missing record id", body = crate::error::ErrorResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn complete(
    State(state): State<crate::AppState>,
    ApiJson(request): ApiJson<CompleteOperationRequest>,
) -> AppResult<Json<ApiResponse<LoadingRecord>>> {
    let raw = request
        .loading_record_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::validation("Loading record id is required"))?;
    let id = Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::NotFound(format!("Loading record {} not found", raw)))?;

    let record = state.services.loading_records.complete(id).await?;
    Ok(ApiResponse::with_message("Loading completed and released", record))
}

/// Progress of the current shift. Always answers 200.
#[utoipa::path(
    get,
    path = "/operation/progress",
    tag = "operation",
    responses(
        (status = 200, description = "Shift progress, or defaults when unavailable", body = OperationProgress)
    )
)]
pub async fn progress(State(state): State<crate::AppState>) -> Json<ApiResponse<OperationProgress>> {
    ApiResponse::ok(state.services.stats.operation_progress().await)
}
