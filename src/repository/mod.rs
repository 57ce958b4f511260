//! Repository layer for database operations

pub mod loading_records;
pub mod shift_forecasts;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub loading_records: loading_records::LoadingRecordsRepository,
    pub shift_forecasts: shift_forecasts::ShiftForecastsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            loading_records: loading_records::LoadingRecordsRepository::new(pool.clone()),
            shift_forecasts: shift_forecasts::ShiftForecastsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Database connectivity probe
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
