//! Shift forecasts repository

use chrono::NaiveDate;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{shift_forecast::ForecastOperation, ShiftCode, ShiftForecast},
};

#[derive(FromRow)]
struct UpsertedForecast {
    #[sqlx(flatten)]
    forecast: ShiftForecast,
    inserted: bool,
}

#[derive(Clone)]
pub struct ShiftForecastsRepository {
    pool: Pool<Postgres>,
}

impl ShiftForecastsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Forecast of a shift for one day
    pub async fn find(&self, shift: ShiftCode, date: NaiveDate) -> AppResult<Option<ShiftForecast>> {
        let forecast = sqlx::query_as::<_, ShiftForecast>(
            r#"
            SELECT id, shift, vehicle_count, forecast_date, created_at, updated_at
            FROM shift_forecasts
            WHERE shift = $1 AND forecast_date = $2
            "#,
        )
        .bind(shift)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(forecast)
    }

    /// Insert the forecast or update the vehicle count of the existing one.
    ///
    /// `xmax = 0` holds only for a freshly inserted row, which tells the two
    /// outcomes apart within a single statement.
    pub async fn upsert(
        &self,
        shift: ShiftCode,
        date: NaiveDate,
        vehicle_count: i32,
    ) -> AppResult<(ForecastOperation, ShiftForecast)> {
        let row = sqlx::query_as::<_, UpsertedForecast>(
            r#"
            INSERT INTO shift_forecasts (id, shift, vehicle_count, forecast_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (shift, forecast_date)
            DO UPDATE SET vehicle_count = EXCLUDED.vehicle_count, updated_at = NOW()
            RETURNING id, shift, vehicle_count, forecast_date, created_at, updated_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(shift)
        .bind(vehicle_count)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        let operation = if row.inserted {
            ForecastOperation::Created
        } else {
            ForecastOperation::Updated
        };
        Ok((operation, row.forecast))
    }

    /// Delete the forecast of a shift for one day. Returns whether one existed.
    pub async fn delete(&self, shift: ShiftCode, date: NaiveDate) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shift_forecasts WHERE shift = $1 AND forecast_date = $2")
            .bind(shift)
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
