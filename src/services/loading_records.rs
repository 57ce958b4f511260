//! Loading record lifecycle service

use uuid::Uuid;

use crate::{
    config::OperationConfig,
    error::AppResult,
    models::{
        loading_record::{CreateLoadingRecord, ProgressUpdate, UpdateLoadingRecord},
        LoadingRecord, OperationClock, ProgressView,
    },
    repository::{loading_records::dock_in_use, Repository},
};

#[derive(Clone)]
pub struct LoadingRecordsService {
    repository: Repository,
    clock: OperationClock,
    operator: String,
    allow_progress_regression: bool,
}

impl LoadingRecordsService {
    pub fn new(repository: Repository, clock: OperationClock, operation: &OperationConfig) -> Self {
        Self {
            repository,
            clock,
            operator: operation.operator.clone(),
            allow_progress_regression: operation.allow_progress_regression,
        }
    }

    /// Register a vehicle on a dock
    pub async fn create(&self, input: CreateLoadingRecord) -> AppResult<LoadingRecord> {
        input.check()?;

        if let Some(occupant) = self.repository.loading_records.find_in_use_on_dock(input.dock).await? {
            tracing::warn!(
                dock = input.dock,
                occupant = %occupant.id,
                "Dock already in use"
            );
            return Err(dock_in_use(input.dock, Some(&occupant)));
        }

        let record = LoadingRecord::new(input, &self.clock.now(), &self.operator);
        self.repository.loading_records.create(&record).await?;

        tracing::info!(
            record_id = %record.id,
            dock = record.dock,
            shift = %record.metadata.shift,
            status = %record.progress.status,
            "Loading record created"
        );
        Ok(record)
    }

    /// Get record by ID
    pub async fn get(&self, id: Uuid) -> AppResult<LoadingRecord> {
        self.repository.loading_records.get_by_id(id).await
    }

    /// All records ordered by dock
    pub async fn list(&self) -> AppResult<Vec<LoadingRecord>> {
        self.repository.loading_records.list().await
    }

    /// Merge a partial update
    pub async fn update(&self, id: Uuid, update: UpdateLoadingRecord) -> AppResult<LoadingRecord> {
        let at = self.clock.now().at;
        let record = self
            .repository
            .loading_records
            .modify(id, move |record| record.apply_update(update, at))
            .await?;

        tracing::info!(record_id = %id, progress = record.progress.percentage, "Loading record updated");
        Ok(record)
    }

    /// Push an explicit progress stage
    pub async fn update_progress(&self, id: Uuid, update: ProgressUpdate) -> AppResult<LoadingRecord> {
        let (percentage, status) = update.check()?;
        let at = self.clock.now().at;
        let allow_regression = self.allow_progress_regression;
        let description = update.description;

        let record = self
            .repository
            .loading_records
            .modify(id, move |record| {
                record.apply_progress(percentage, status, description, at, allow_regression)
            })
            .await?;

        tracing::info!(record_id = %id, percentage, status = %status, "Progress updated");
        Ok(record)
    }

    /// Progress projection of a record
    pub async fn get_progress(&self, id: Uuid) -> AppResult<ProgressView> {
        self.get(id).await.map(ProgressView::from)
    }

    /// One-shot completion once the schedule is complete
    pub async fn finalize(&self, id: Uuid) -> AppResult<LoadingRecord> {
        let at = self.clock.now().at;
        let record = self
            .repository
            .loading_records
            .modify(id, move |record| record.finalize(at))
            .await?;

        tracing::info!(record_id = %id, dock = record.dock, "Loading record finalized");
        Ok(record)
    }

    /// Completion from the overall operation view
    pub async fn complete(&self, id: Uuid) -> AppResult<LoadingRecord> {
        let at = self.clock.now().at;
        let record = self
            .repository
            .loading_records
            .modify(id, move |record| {
                record.complete(at);
                Ok(())
            })
            .await?;

        tracing::info!(record_id = %id, dock = record.dock, "Loading record completed");
        Ok(record)
    }
}
