//! Shift forecast service

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{
        estimate_forecast,
        shift_forecast::{ForecastLookup, ForecastUpsertResult, UpsertForecast},
        OperationClock, ShiftCode,
    },
    repository::Repository,
};

/// Vehicle target of a shift, and whether it was estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastTotal {
    pub total: i64,
    pub estimated: bool,
}

#[derive(Clone)]
pub struct ForecastsService {
    repository: Repository,
    clock: OperationClock,
}

impl ForecastsService {
    pub fn new(repository: Repository, clock: OperationClock) -> Self {
        Self { repository, clock }
    }

    /// Forecast of a shift for today
    pub async fn get(&self, shift: ShiftCode) -> AppResult<ForecastLookup> {
        let today = self.clock.today();
        let forecast = self.repository.shift_forecasts.find(shift, today).await?;
        Ok(ForecastLookup::new(shift, today, forecast))
    }

    /// Create today's forecast for a shift, or update its vehicle count
    pub async fn upsert(&self, input: UpsertForecast) -> AppResult<ForecastUpsertResult> {
        let (shift, vehicle_count) = input.check()?;
        let today = self.clock.today();

        let (operation, forecast) = self
            .repository
            .shift_forecasts
            .upsert(shift, today, vehicle_count)
            .await?;

        tracing::info!(shift = %shift, date = %today, vehicle_count, ?operation, "Shift forecast saved");
        Ok(ForecastUpsertResult { operation, forecast })
    }

    /// Remove today's forecast for a shift
    pub async fn delete(&self, shift: ShiftCode) -> AppResult<()> {
        let today = self.clock.today();
        if !self.repository.shift_forecasts.delete(shift, today).await? {
            return Err(AppError::NotFound(format!(
                "No forecast found for shift {} on {}",
                shift, today
            )));
        }

        tracing::info!(shift = %shift, date = %today, "Shift forecast deleted");
        Ok(())
    }

    /// Forecast total of a shift, estimated from its records when none was entered
    pub async fn total_for(&self, day: NaiveDate, shift: ShiftCode) -> AppResult<ForecastTotal> {
        if let Some(forecast) = self.repository.shift_forecasts.find(shift, day).await? {
            return Ok(ForecastTotal {
                total: i64::from(forecast.vehicle_count),
                estimated: false,
            });
        }

        let registered = self.repository.loading_records.count_in_shift(day, shift).await?;
        Ok(ForecastTotal {
            total: estimate_forecast(registered),
            estimated: true,
        })
    }
}
