//! Shift forecast model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::shift::ShiftCode;
use crate::error::{validation_messages, AppError, AppResult};

/// Forecast used when a shift has no records yet
pub const DEFAULT_FORECAST: i64 = 15;
/// Margin added on top of the records already registered in the shift
pub const FORECAST_MARGIN: i64 = 5;
/// Lower bound of an estimated forecast
pub const MIN_ESTIMATED_FORECAST: i64 = 10;

/// Estimate the expected vehicle count of a shift that has no forecast.
pub fn estimate_forecast(records_in_shift: i64) -> i64 {
    if records_in_shift <= 0 {
        DEFAULT_FORECAST
    } else {
        (records_in_shift + FORECAST_MARGIN).max(MIN_ESTIMATED_FORECAST)
    }
}

/// Supervisor-entered vehicle target for one shift of one day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftForecast {
    pub id: Uuid,
    pub shift: ShiftCode,
    pub vehicle_count: i32,
    /// Operation day the forecast applies to
    #[sqlx(rename = "forecast_date")]
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query for the forecast of a shift
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    /// A or B (SBA02 / SBA04 accepted)
    pub shift: Option<String>,
}

impl ForecastQuery {
    pub fn shift(&self) -> AppResult<ShiftCode> {
        parse_shift(self.shift.as_deref())
    }
}

/// Create or update forecast request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertForecast {
    /// A or B (SBA02 / SBA04 accepted)
    pub shift: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Invalid vehicle count. Use a value between 1 and 100"))]
    pub vehicle_count: Option<i64>,
}

impl UpsertForecast {
    /// Validated (shift, vehicle count)
    pub fn check(&self) -> AppResult<(ShiftCode, i32)> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => validation_messages(&e),
        };

        let shift = parse_shift(self.shift.as_deref())
            .map_err(|e| {
                if let AppError::Validation(msgs) = e {
                    errors.extend(msgs);
                }
            })
            .ok();
        if self.vehicle_count.is_none() {
            errors.push("Vehicle count is required".to_string());
        }

        match (shift, self.vehicle_count) {
            (Some(shift), Some(count)) if errors.is_empty() => Ok((shift, count as i32)),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

fn parse_shift(raw: Option<&str>) -> AppResult<ShiftCode> {
    match raw {
        Some(s) => s.parse().map_err(AppError::validation),
        None => Err(AppError::validation("Shift is required. Use A or B")),
    }
}

/// Which write an upsert performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ForecastOperation {
    Created,
    Updated,
}

/// Result of a forecast upsert
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastUpsertResult {
    pub operation: ForecastOperation,
    pub forecast: ShiftForecast,
}

/// Forecast lookup for (shift, today). Absence is a normal answer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastLookup {
    pub exists: bool,
    pub shift: ShiftCode,
    pub date: NaiveDate,
    pub vehicle_count: Option<i32>,
    pub forecast: Option<ShiftForecast>,
}

impl ForecastLookup {
    pub fn new(shift: ShiftCode, date: NaiveDate, forecast: Option<ShiftForecast>) -> Self {
        Self {
            exists: forecast.is_some(),
            shift,
            date,
            vehicle_count: forecast.as_ref().map(|f| f.vehicle_count),
            forecast,
        }
    }
}
