//! Business logic services

pub mod dashboard;
pub mod forecasts;
pub mod loading_records;
pub mod stats;

use crate::{config::OperationConfig, error::AppResult, models::OperationClock, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    repository: Repository,
    pub loading_records: loading_records::LoadingRecordsService,
    pub forecasts: forecasts::ForecastsService,
    pub stats: stats::StatsService,
    pub dashboard: dashboard::DashboardService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, operation: &OperationConfig) -> Self {
        let clock = OperationClock::from_offset_hours(operation.utc_offset_hours);
        let forecasts = forecasts::ForecastsService::new(repository.clone(), clock);

        Self {
            loading_records: loading_records::LoadingRecordsService::new(
                repository.clone(),
                clock,
                operation,
            ),
            stats: stats::StatsService::new(repository.clone(), forecasts.clone(), clock),
            dashboard: dashboard::DashboardService::new(repository.clone(), clock),
            forecasts,
            repository,
        }
    }

    /// Check that the database answers
    pub async fn check_database(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
