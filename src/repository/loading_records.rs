//! Loading records repository

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, FromRow, Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        loading_record::{Cargo, Driver, LoadingRecord, Plates, RecordMetadata, RecordTimestamps, Seals},
        LifecycleStatus, Progress, Schedule, ShiftCode, VehicleType,
    },
};

/// Partial unique index guarding dock occupancy
const DOCK_IN_USE_INDEX: &str = "loading_records_dock_in_use";

const COLUMNS: &str = r#"
    id, dock, destination_city, sequence_number, vehicle_type, lifecycle_status, notes,
    driver, plates, seals, cargo, schedule, progress,
    created_at, docked_at, loading_started_at, loading_finished_at, released_at, updated_at,
    operation_day, shift, operator, finalized_by_button
"#;

/// Row shape of `loading_records`; nested sub-documents live in JSONB columns
#[derive(Debug, FromRow)]
struct LoadingRecordRow {
    id: Uuid,
    dock: i32,
    destination_city: String,
    sequence_number: i32,
    vehicle_type: VehicleType,
    lifecycle_status: LifecycleStatus,
    notes: Option<String>,
    driver: Json<Driver>,
    plates: Json<Plates>,
    seals: Json<Seals>,
    cargo: Json<Cargo>,
    schedule: Json<Schedule>,
    progress: Json<Progress>,
    created_at: DateTime<Utc>,
    docked_at: Option<DateTime<Utc>>,
    loading_started_at: Option<DateTime<Utc>>,
    loading_finished_at: Option<DateTime<Utc>>,
    released_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    operation_day: NaiveDate,
    shift: ShiftCode,
    operator: String,
    finalized_by_button: bool,
}

impl From<LoadingRecordRow> for LoadingRecord {
    fn from(row: LoadingRecordRow) -> Self {
        Self {
            id: row.id,
            dock: row.dock,
            destination_city: row.destination_city,
            sequence_number: row.sequence_number,
            driver: row.driver.0,
            vehicle_type: row.vehicle_type,
            plates: row.plates.0,
            seals: row.seals.0,
            cargo: row.cargo.0,
            schedule: row.schedule.0,
            progress: row.progress.0,
            lifecycle_status: row.lifecycle_status,
            notes: row.notes,
            timestamps: RecordTimestamps {
                created_at: row.created_at,
                docked_at: row.docked_at,
                loading_started_at: row.loading_started_at,
                loading_finished_at: row.loading_finished_at,
                released_at: row.released_at,
                updated_at: row.updated_at,
            },
            metadata: RecordMetadata {
                operation_day: row.operation_day,
                shift: row.shift,
                operator: row.operator,
                finalized_by_button: row.finalized_by_button,
            },
        }
    }
}

/// Conflict error naming the driver that holds the dock
pub fn dock_in_use(dock: i32, occupant: Option<&LoadingRecord>) -> AppError {
    let driver = occupant.map(|r| r.driver.name.clone());
    let message = match &driver {
        Some(name) => format!("Dock {} is already in use by {}", dock, name),
        None => format!("Dock {} is already in use", dock),
    };
    AppError::Conflict {
        message,
        occupied_by: driver,
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Loading record {} not found", id))
}

fn violates_dock_index(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(DOCK_IN_USE_INDEX))
}

#[derive(Clone)]
pub struct LoadingRecordsRepository {
    pool: Pool<Postgres>,
}

impl LoadingRecordsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a new record. Fails with a conflict if its dock is taken.
    pub async fn create(&self, record: &LoadingRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO loading_records (
                id, dock, destination_city, sequence_number, vehicle_type, lifecycle_status,
                progress_status, progress_percentage, notes,
                driver, plates, seals, cargo, schedule, progress,
                created_at, docked_at, loading_started_at, loading_finished_at, released_at, updated_at,
                operation_day, shift, operator, finalized_by_button
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
            "#,
        )
        .bind(record.id)
        .bind(record.dock)
        .bind(&record.destination_city)
        .bind(record.sequence_number)
        .bind(record.vehicle_type)
        .bind(record.lifecycle_status)
        .bind(record.progress.status)
        .bind(record.progress.percentage as i16)
        .bind(&record.notes)
        .bind(Json(&record.driver))
        .bind(Json(&record.plates))
        .bind(Json(&record.seals))
        .bind(Json(&record.cargo))
        .bind(Json(&record.schedule))
        .bind(Json(&record.progress))
        .bind(record.timestamps.created_at)
        .bind(record.timestamps.docked_at)
        .bind(record.timestamps.loading_started_at)
        .bind(record.timestamps.loading_finished_at)
        .bind(record.timestamps.released_at)
        .bind(record.timestamps.updated_at)
        .bind(record.metadata.operation_day)
        .bind(record.metadata.shift)
        .bind(&record.metadata.operator)
        .bind(record.metadata.finalized_by_button)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if violates_dock_index(&e) => Err(self.occupied(record.dock).await),
            Err(e) => Err(e.into()),
        }
    }

    /// Get record by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<LoadingRecord> {
        let query = format!("SELECT {} FROM loading_records WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, LoadingRecordRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LoadingRecord::from)
            .ok_or_else(|| not_found(id))
    }

    /// All records ordered by dock
    pub async fn list(&self) -> AppResult<Vec<LoadingRecord>> {
        let query = format!(
            "SELECT {} FROM loading_records ORDER BY dock ASC, created_at ASC",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, LoadingRecordRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LoadingRecord::from).collect())
    }

    /// Record currently holding a dock, if any
    pub async fn find_in_use_on_dock(&self, dock: i32) -> AppResult<Option<LoadingRecord>> {
        let query = format!(
            "SELECT {} FROM loading_records WHERE dock = $1 AND lifecycle_status = $2 LIMIT 1",
            COLUMNS
        );
        let row = sqlx::query_as::<_, LoadingRecordRow>(&query)
            .bind(dock)
            .bind(LifecycleStatus::InUse)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LoadingRecord::from))
    }

    /// Records of an operation day ordered by dock
    pub async fn list_for_day(
        &self,
        day: NaiveDate,
        include_cancelled: bool,
    ) -> AppResult<Vec<LoadingRecord>> {
        let filter = if include_cancelled {
            ""
        } else {
            "AND lifecycle_status <> 'cancelled'"
        };
        let query = format!(
            "SELECT {} FROM loading_records WHERE operation_day = $1 {} ORDER BY dock ASC, created_at ASC",
            COLUMNS, filter
        );
        let rows = sqlx::query_as::<_, LoadingRecordRow>(&query)
            .bind(day)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LoadingRecord::from).collect())
    }

    /// Non-cancelled records registered in a shift of a day
    pub async fn count_in_shift(&self, day: NaiveDate, shift: ShiftCode) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM loading_records
            WHERE operation_day = $1 AND shift = $2 AND lifecycle_status <> 'cancelled'
            "#,
        )
        .bind(day)
        .bind(shift)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Completed records of a shift: lifecycle completed, or progress at (100, released)
    pub async fn count_completed(&self, day: NaiveDate, shift: ShiftCode) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM loading_records
            WHERE operation_day = $1 AND shift = $2
              AND (lifecycle_status = 'completed'
                   OR (progress_percentage = 100 AND progress_status = 'released'))
            "#,
        )
        .bind(day)
        .bind(shift)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Atomic read-modify-write of one record.
    ///
    /// The row stays locked (`FOR UPDATE`) from the read until the write
    /// commits, so concurrent modifications are applied one after another.
    /// If `apply` fails nothing is written.
    pub async fn modify<F>(&self, id: Uuid, apply: F) -> AppResult<LoadingRecord>
    where
        F: FnOnce(&mut LoadingRecord) -> AppResult<()> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "SELECT {} FROM loading_records WHERE id = $1 FOR UPDATE",
            COLUMNS
        );
        let mut record = sqlx::query_as::<_, LoadingRecordRow>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .map(LoadingRecord::from)
            .ok_or_else(|| not_found(id))?;

        apply(&mut record)?;

        match Self::write(&mut tx, &record).await {
            Ok(()) => {}
            Err(e) if violates_dock_index(&e) => {
                drop(tx);
                return Err(self.occupied(record.dock).await);
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        Ok(record)
    }

    async fn write(tx: &mut Transaction<'_, Postgres>, record: &LoadingRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE loading_records SET
                destination_city = $2, sequence_number = $3, vehicle_type = $4,
                lifecycle_status = $5, progress_status = $6, progress_percentage = $7, notes = $8,
                driver = $9, plates = $10, seals = $11, cargo = $12, schedule = $13, progress = $14,
                docked_at = $15, loading_started_at = $16, loading_finished_at = $17,
                released_at = $18, updated_at = $19, finalized_by_button = $20
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.destination_city)
        .bind(record.sequence_number)
        .bind(record.vehicle_type)
        .bind(record.lifecycle_status)
        .bind(record.progress.status)
        .bind(record.progress.percentage as i16)
        .bind(&record.notes)
        .bind(Json(&record.driver))
        .bind(Json(&record.plates))
        .bind(Json(&record.seals))
        .bind(Json(&record.cargo))
        .bind(Json(&record.schedule))
        .bind(Json(&record.progress))
        .bind(record.timestamps.docked_at)
        .bind(record.timestamps.loading_started_at)
        .bind(record.timestamps.loading_finished_at)
        .bind(record.timestamps.released_at)
        .bind(record.timestamps.updated_at)
        .bind(record.metadata.finalized_by_button)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Build the conflict error for a dock taken by a concurrent writer
    async fn occupied(&self, dock: i32) -> AppError {
        match self.find_in_use_on_dock(dock).await {
            Ok(occupant) => dock_in_use(dock, occupant.as_ref()),
            Err(e) => e,
        }
    }
}
