//! Shift forecast endpoints
//!
//! Also mounted under `/operation/forecast`.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        shift_forecast::{
            ForecastLookup, ForecastOperation, ForecastQuery, ForecastUpsertResult, UpsertForecast,
        },
        ShiftCode,
    },
};

use super::{ApiJson, ApiQuery, ApiResponse};

#[derive(Serialize, ToSchema)]
pub struct DeletedForecast {
    pub shift: ShiftCode,
}

/// Today's forecast for a shift
#[utoipa::path(
    get,
    path = "/shift-forecast",
    tag = "forecasts",
    params(ForecastQuery),
    responses(
        (status = 200, description = "Forecast lookup; `exists` is false when none was entered", body = ForecastLookup),
        (status = 400, description = "Invalid shift", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_forecast(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<ForecastQuery>,
) -> AppResult<Json<ApiResponse<ForecastLookup>>> {
    let shift = query.shift()?;
    let lookup = state.services.forecasts.get(shift).await?;
    Ok(ApiResponse::ok(lookup))
}

/// Create or update today's forecast for a shift
#[utoipa::path(
    post,
    path = "/shift-forecast",
    tag = "forecasts",
    request_body = UpsertForecast,
    responses(
        (status = 200, description = "Forecast created or updated", body = ForecastUpsertResult),
        (status = 400, description = "Invalid shift or vehicle count", body = crate::error::ErrorResponse)
    )
)]
pub async fn upsert_forecast(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<UpsertForecast>,
) -> AppResult<Json<ApiResponse<ForecastUpsertResult>>> {
    let result = state.services.forecasts.upsert(data).await?;
    let message = match result.operation {
        ForecastOperation::Created => "Forecast created",
        ForecastOperation::Updated => "Forecast updated",
    };
    Ok(ApiResponse::with_message(message, result))
}

/// Delete today's forecast for a shift
#[utoipa::path(
    delete,
    path = "/shift-forecast",
    tag = "forecasts",
    params(ForecastQuery),
    responses(
        (status = 200, description = "Forecast deleted", body = DeletedForecast),
        (status = 404, description = "No forecast for this shift today", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_forecast(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<ForecastQuery>,
) -> AppResult<Json<ApiResponse<DeletedForecast>>> {
    let shift = query.shift()?;
    state.services.forecasts.delete(shift).await?;
    Ok(ApiResponse::with_message("Forecast deleted", DeletedForecast { shift }))
}
