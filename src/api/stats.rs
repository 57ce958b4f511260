//! Operation statistics endpoints

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ShiftCode, VehicleType},
};

use super::{ApiQuery, ApiResponse};

/// Statistics query
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatisticsQuery {
    /// Operation day (YYYY-MM-DD), defaults to today
    pub day: Option<String>,
    /// A or B, defaults to the current shift
    pub shift: Option<String>,
}

impl StatisticsQuery {
    pub fn day(&self) -> AppResult<Option<NaiveDate>> {
        parse_day(self.day.as_deref())
    }

    pub fn shift(&self) -> AppResult<Option<ShiftCode>> {
        self.shift
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse().map_err(AppError::validation))
            .transpose()
    }
}

/// Parse an optional YYYY-MM-DD day parameter
pub fn parse_day(raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| AppError::validation(format!("Invalid date '{}'. Use YYYY-MM-DD", s)))
        })
        .transpose()
}

/// Statistics of one operation day
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatistics {
    pub day: NaiveDate,
    pub shift: ShiftCode,
    /// Forecast vehicle count of the shift
    pub total_forecast: i64,
    /// True when no forecast was entered and the total was estimated
    pub forecast_estimated: bool,
    pub statistics: StatusCounts,
    /// Cities by vehicle count, largest first
    pub cities: Vec<CityShare>,
    pub top_city: Option<CityShare>,
    pub average_time: AverageTime,
    pub completion: Completion,
    pub docks: Vec<DockSummary>,
    /// First records of the day, for the operation table
    pub active_records: Vec<ActiveRecordRow>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: i64,
    pub by_lifecycle: LifecycleCounts,
    /// Completed through the finalize action
    pub finalized_by_button: i64,
    pub by_stage: StageCounts,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleCounts {
    pub pending: i64,
    pub in_use: i64,
    pub completed: i64,
    pub released: i64,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageCounts {
    pub queued: i64,
    pub docked: i64,
    pub loading: i64,
    pub finished: i64,
    pub released: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityShare {
    pub name: String,
    pub quantity: i64,
    /// Cargo kinds seen for this city
    pub cargo_types: Vec<String>,
    /// Share of the day's records, one decimal
    pub percentage: f64,
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AverageTime {
    pub minutes: i64,
    /// "Hh Mm", or "N/A" when no record was released
    pub formatted: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub completed: i64,
    /// 0-100
    pub percentage: u8,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DockSummary {
    pub dock: i32,
    pub total: i64,
    pub completed: i64,
    /// Mean progress percentage, one decimal
    pub average_progress: f64,
}

/// Coarse progress bucket of the operation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActiveBucket {
    Waiting,
    InProgress,
    Complete,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRecordRow {
    pub id: Uuid,
    pub plate: String,
    pub status: ActiveBucket,
    pub destination_city: String,
    pub vehicle_type: VehicleType,
    /// Cargo kinds, comma separated, or "N/A"
    pub cargo: String,
    /// Local "HH:MM" of registration
    pub entry_time: String,
    pub waiting_time: String,
}

/// Operation statistics for a day and shift
#[utoipa::path(
    get,
    path = "/operation/statistics",
    tag = "operation",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Statistics in the success envelope", body = OperationStatistics),
        (status = 400, description = "Invalid day or shift", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_statistics(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<StatisticsQuery>,
) -> AppResult<Json<ApiResponse<OperationStatistics>>> {
    let day = query.day()?;
    let shift = query.shift()?;
    let statistics = state.services.stats.statistics(day, shift).await?;
    Ok(ApiResponse::ok(statistics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day(None).unwrap(), None);
        assert_eq!(parse_day(Some("")).unwrap(), None);
        assert_eq!(
            parse_day(Some("2024-05-02")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
        assert!(parse_day(Some("02/05/2024")).is_err());
    }

    #[test]
    fn test_statistics_query_shift() {
        let query = StatisticsQuery {
            day: None,
            shift: Some("SBA02".into()),
        };
        assert_eq!(query.shift().unwrap(), Some(ShiftCode::A));

        let bad = StatisticsQuery {
            day: None,
            shift: Some("X".into()),
        };
        assert!(bad.shift().is_err());
    }
}
