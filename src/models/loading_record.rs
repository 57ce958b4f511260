//! Loading record model: one vehicle visit to a dock, and its lifecycle rules

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{
    enums::{LifecycleStatus, ProgressStatus, VehicleType},
    progress::{compute_progress, is_blank, Progress, Schedule, ScheduleField},
    shift::{OperationMoment, ShiftCode},
};
use crate::error::{validation_messages, AppError, AppResult};

pub const MIN_DOCK: i32 = 1;
pub const MAX_DOCK: i32 = 20;

const FINALIZE_DESCRIPTION: &str = "Loading finalized by button - vehicle released for departure";
const COMPLETE_DESCRIPTION: &str = "Loading completed and released";

// ---------------------------------------------------------------------------
// Sub-documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub name: String,
    /// CPF or other tax identifier
    #[serde(default)]
    pub tax_id: Option<String>,
}

/// Driver as sent by clients: a bare name or a structured object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DriverInput {
    Name(String),
    Details(DriverDetails),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "cpf")]
    pub tax_id: Option<String>,
}

impl DriverInput {
    pub fn into_driver(self) -> Driver {
        let mut driver = Driver::default();
        self.apply_to(&mut driver);
        driver
    }

    /// Merge the supplied parts into an existing driver
    pub fn apply_to(self, driver: &mut Driver) {
        match self {
            DriverInput::Name(name) => driver.name = name,
            DriverInput::Details(details) => {
                if let Some(name) = details.name {
                    driver.name = name;
                }
                if details.tax_id.is_some() {
                    driver.tax_id = details.tax_id;
                }
            }
        }
    }
}

/// Plate fields. BODYWORK uses tractor + box, every other type a single plate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plates {
    #[serde(default)]
    pub simple_plate: Option<String>,
    #[serde(default)]
    pub tractor_plate: Option<String>,
    #[serde(default)]
    pub box_plate: Option<String>,
}

impl Plates {
    /// Keep only the group that applies to the vehicle type
    pub fn for_vehicle(self, vehicle_type: VehicleType) -> Self {
        if vehicle_type.is_bodywork() {
            Plates {
                simple_plate: None,
                ..self
            }
        } else {
            Plates {
                simple_plate: self.simple_plate,
                tractor_plate: None,
                box_plate: None,
            }
        }
    }

    /// Overlay the plates supplied in an update
    fn merge(&mut self, update: Plates) {
        if update.simple_plate.is_some() {
            self.simple_plate = update.simple_plate;
        }
        if update.tractor_plate.is_some() {
            self.tractor_plate = update.tractor_plate;
        }
        if update.box_plate.is_some() {
            self.box_plate = update.box_plate;
        }
    }

    /// Message describing the missing plate group, if any
    pub fn missing_for(&self, vehicle_type: VehicleType) -> Option<String> {
        if vehicle_type.is_bodywork() {
            (is_blank(&self.tractor_plate) || is_blank(&self.box_plate))
                .then(|| "For BODYWORK, provide both tractor and box plates".to_string())
        } else {
            is_blank(&self.simple_plate).then(|| format!("Provide the {} plate", vehicle_type))
        }
    }

    /// Plate shown on dashboards ("tractor / box" for BODYWORK)
    pub fn display(&self, vehicle_type: VehicleType) -> String {
        if vehicle_type.is_bodywork() {
            let tractor = self.tractor_plate.clone().unwrap_or_default();
            match self.box_plate.as_deref().filter(|b| !b.trim().is_empty()) {
                Some(b) => format!("{} / {}", tractor, b),
                None => tractor,
            }
        } else {
            self.simple_plate.clone().unwrap_or_default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Seals {
    #[serde(default)]
    pub rear: String,
    #[serde(default)]
    pub left_side: Option<String>,
    #[serde(default)]
    pub right_side: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SealsUpdate {
    pub rear: Option<String>,
    pub left_side: Option<String>,
    pub right_side: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cargo {
    #[serde(default)]
    pub cages: u32,
    #[serde(default)]
    pub bulky_items: u32,
    #[serde(default)]
    pub pallet_sleeves: u32,
}

impl Cargo {
    /// Labels of the cargo kinds present in this load
    pub fn kinds(&self) -> Vec<&'static str> {
        [
            (self.cages, "Cages"),
            (self.bulky_items, "Bulky items"),
            (self.pallet_sleeves, "Pallet sleeves"),
        ]
        .into_iter()
        .filter(|(quantity, _)| *quantity > 0)
        .map(|(_, label)| label)
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CargoUpdate {
    pub cages: Option<u32>,
    pub bulky_items: Option<u32>,
    pub pallet_sleeves: Option<u32>,
}

/// Real instants at which each stage was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordTimestamps {
    pub created_at: DateTime<Utc>,
    pub docked_at: Option<DateTime<Utc>>,
    pub loading_started_at: Option<DateTime<Utc>>,
    pub loading_finished_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RecordTimestamps {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            docked_at: None,
            loading_started_at: None,
            loading_finished_at: None,
            released_at: None,
            updated_at: at,
        }
    }

    fn slot(&mut self, stage: ProgressStatus) -> Option<&mut Option<DateTime<Utc>>> {
        match stage {
            ProgressStatus::Queued => None,
            ProgressStatus::Docked => Some(&mut self.docked_at),
            ProgressStatus::Loading => Some(&mut self.loading_started_at),
            ProgressStatus::Finished => Some(&mut self.loading_finished_at),
            ProgressStatus::Released => Some(&mut self.released_at),
        }
    }

    /// Set the instant of a stage, replacing any earlier value
    pub fn stamp(&mut self, stage: ProgressStatus, at: DateTime<Utc>) {
        if let Some(slot) = self.slot(stage) {
            *slot = Some(at);
        }
    }

    /// Set the instant of a stage unless it was already reached
    pub fn stamp_once(&mut self, stage: ProgressStatus, at: DateTime<Utc>) {
        if let Some(slot) = self.slot(stage) {
            slot.get_or_insert(at);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    /// Local calendar day the record belongs to
    pub operation_day: NaiveDate,
    pub shift: ShiftCode,
    pub operator: String,
    /// Completed through the one-shot finalize action
    pub finalized_by_button: bool,
}

// ---------------------------------------------------------------------------
// LoadingRecord
// ---------------------------------------------------------------------------

/// Loading record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadingRecord {
    pub id: Uuid,
    /// Dock number (1-20)
    pub dock: i32,
    pub destination_city: String,
    /// Position of the vehicle in its convoy
    pub sequence_number: i32,
    pub driver: Driver,
    pub vehicle_type: VehicleType,
    pub plates: Plates,
    pub seals: Seals,
    pub cargo: Cargo,
    pub schedule: Schedule,
    pub progress: Progress,
    pub lifecycle_status: LifecycleStatus,
    pub notes: Option<String>,
    pub timestamps: RecordTimestamps,
    pub metadata: RecordMetadata,
}

impl LoadingRecord {
    /// Build a new record from validated input.
    ///
    /// The initial stage is derived from whatever schedule marks were
    /// pre-filled, and the history log starts with that stage.
    pub fn new(input: CreateLoadingRecord, moment: &OperationMoment, operator: &str) -> Self {
        let at = moment.at;
        let vehicle_type = input.vehicle_type.unwrap_or_default();
        let (percentage, status) = compute_progress(&input.schedule);

        let mut timestamps = RecordTimestamps::new(at);
        timestamps.stamp(status, at);

        Self {
            id: Uuid::new_v4(),
            dock: input.dock,
            destination_city: input.destination_city.unwrap_or_default().trim().to_string(),
            sequence_number: input.sequence_number.unwrap_or(0),
            driver: input.driver.map(DriverInput::into_driver).unwrap_or_default(),
            vehicle_type,
            plates: input.plates.for_vehicle(vehicle_type),
            seals: input.seals,
            cargo: input.cargo,
            schedule: input.schedule,
            progress: Progress::start(percentage, status, status.description().to_string(), at),
            lifecycle_status: LifecycleStatus::InUse,
            notes: input.notes,
            timestamps,
            metadata: RecordMetadata {
                operation_day: moment.day,
                shift: moment.shift,
                operator: operator.to_string(),
                finalized_by_button: false,
            },
        }
    }

    /// Completed either by lifecycle or by reaching (100, released)
    pub fn is_completed(&self) -> bool {
        self.lifecycle_status == LifecycleStatus::Completed || self.progress.is_released()
    }

    /// Merge a partial update into the record.
    ///
    /// Schedule marks are fill-only: a mark already holding a value is never
    /// overwritten. Filling `releasedAt` releases the dock.
    pub fn apply_update(&mut self, update: UpdateLoadingRecord, at: DateTime<Utc>) -> AppResult<()> {
        let mut errors = Vec::new();

        if let Some(city) = update.destination_city {
            if city.trim().is_empty() {
                errors.push("Destination city cannot be blank".to_string());
            } else {
                self.destination_city = city.trim().to_string();
            }
        }
        if let Some(sequence) = update.sequence_number {
            self.sequence_number = sequence;
        }
        if let Some(driver) = update.driver {
            driver.apply_to(&mut self.driver);
            if self.driver.name.trim().is_empty() {
                errors.push("Driver name is required".to_string());
            }
        }
        if let Some(vehicle_type) = update.vehicle_type {
            self.vehicle_type = vehicle_type;
        }
        if let Some(status) = update.lifecycle_status {
            self.lifecycle_status = status;
        }

        if let Some(plates) = update.plates {
            self.plates.merge(plates);
        }
        self.plates = std::mem::take(&mut self.plates).for_vehicle(self.vehicle_type);
        if let Some(msg) = self.plates.missing_for(self.vehicle_type) {
            errors.push(msg);
        }

        if let Some(seals) = update.seals {
            if let Some(rear) = seals.rear {
                self.seals.rear = rear;
            }
            if seals.left_side.is_some() {
                self.seals.left_side = seals.left_side;
            }
            if seals.right_side.is_some() {
                self.seals.right_side = seals.right_side;
            }
        }
        if let Some(cargo) = update.cargo {
            self.cargo.cages = cargo.cages.unwrap_or(self.cargo.cages);
            self.cargo.bulky_items = cargo.bulky_items.unwrap_or(self.cargo.bulky_items);
            self.cargo.pallet_sleeves = cargo.pallet_sleeves.unwrap_or(self.cargo.pallet_sleeves);
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if let Some(schedule) = update.schedule {
            self.fill_schedule(schedule, at);
        }

        self.timestamps.updated_at = at;
        Ok(())
    }

    fn fill_schedule(&mut self, incoming: Schedule, at: DateTime<Utc>) {
        let mut filled = Vec::new();
        for field in ScheduleField::ALL {
            if self.schedule.is_filled(field) || !incoming.is_filled(field) {
                continue;
            }
            *self.schedule.get_mut(field) = incoming.get(field).clone();
            filled.push(field);
        }

        if filled.is_empty() {
            return;
        }
        for field in &filled {
            self.timestamps.stamp_once(field.stage(), at);
        }
        if filled.contains(&ScheduleField::ReleasedAt) {
            self.lifecycle_status = LifecycleStatus::Released;
        }

        let (percentage, status) = compute_progress(&self.schedule);
        if percentage > self.progress.percentage {
            self.progress
                .record(percentage, status, status.description().to_string(), at);
        }
    }

    /// Push an explicit progress stage, appending to the history log
    pub fn apply_progress(
        &mut self,
        percentage: u8,
        status: ProgressStatus,
        description: Option<String>,
        at: DateTime<Utc>,
        allow_regression: bool,
    ) -> AppResult<()> {
        let current = self.progress.percentage;
        if percentage < current {
            if !allow_regression {
                return Err(AppError::validation(format!(
                    "Progress cannot go back from {}% to {}%",
                    current, percentage
                )));
            }
            tracing::warn!(
                record_id = %self.id,
                from = current,
                to = percentage,
                "Progress regression recorded"
            );
        }

        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Progress updated to {}%", percentage));
        self.progress.record(percentage, status, description, at);
        self.timestamps.stamp(status, at);
        if status == ProgressStatus::Released {
            self.lifecycle_status = LifecycleStatus::Completed;
        }
        self.timestamps.updated_at = at;
        Ok(())
    }

    /// One-shot completion once every schedule mark is filled
    pub fn finalize(&mut self, at: DateTime<Utc>) -> AppResult<()> {
        let missing = self.schedule.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Precondition {
                message: "All schedule times must be filled before finalizing".to_string(),
                missing: missing.iter().map(|f| f.name().to_string()).collect(),
            });
        }

        self.release(FINALIZE_DESCRIPTION, at);
        self.metadata.finalized_by_button = true;
        Ok(())
    }

    /// Completion triggered from the overall operation view
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.release(COMPLETE_DESCRIPTION, at);
    }

    fn release(&mut self, description: &str, at: DateTime<Utc>) {
        let status = ProgressStatus::Released;
        self.progress
            .record(status.percentage(), status, description.to_string(), at);
        self.lifecycle_status = LifecycleStatus::Completed;
        self.timestamps.released_at = Some(at);
        self.timestamps.updated_at = at;
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Create loading record request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoadingRecord {
    /// Dock number (1-20)
    #[serde(default)]
    #[validate(range(min = 1, max = 20, message = "Invalid dock (1-20)"))]
    pub dock: i32,
    #[serde(default)]
    pub destination_city: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<i32>,
    /// Driver name, or `{name, taxId}`
    #[serde(default)]
    #[schema(value_type = Object)]
    pub driver: Option<DriverInput>,
    /// Defaults to "3/4"
    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,
    #[serde(default)]
    pub plates: Plates,
    #[serde(default)]
    pub seals: Seals,
    #[serde(default)]
    pub cargo: Cargo,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateLoadingRecord {
    /// Check every creation rule and report all violations at once
    pub fn check(&self) -> AppResult<()> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => validation_messages(&e),
        };

        if is_blank(&self.destination_city) {
            errors.push("Destination city is required".to_string());
        }

        let driver_name = match &self.driver {
            Some(DriverInput::Name(name)) => Some(name.as_str()),
            Some(DriverInput::Details(details)) => details.name.as_deref(),
            None => None,
        };
        if driver_name.map_or(true, |n| n.trim().is_empty()) {
            errors.push("Driver name is required".to_string());
        }

        if let Some(msg) = self.plates.missing_for(self.vehicle_type.unwrap_or_default()) {
            errors.push(msg);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

/// Update loading record request. Only the fields present are merged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLoadingRecord {
    pub destination_city: Option<String>,
    pub sequence_number: Option<i32>,
    /// Driver name, or `{name, taxId}`
    #[schema(value_type = Object)]
    pub driver: Option<DriverInput>,
    pub vehicle_type: Option<VehicleType>,
    pub plates: Option<Plates>,
    pub seals: Option<SealsUpdate>,
    pub cargo: Option<CargoUpdate>,
    /// Only blank marks are filled
    pub schedule: Option<Schedule>,
    pub lifecycle_status: Option<LifecycleStatus>,
    pub notes: Option<String>,
}

/// Explicit progress update request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// 0-100
    #[validate(range(min = 0, max = 100, message = "Percentage must be between 0 and 100"))]
    pub percentage: Option<i64>,
    /// queued, docked, loading, finished or released
    pub status: Option<String>,
    pub description: Option<String>,
}

impl ProgressUpdate {
    /// Validated (percentage, status)
    pub fn check(&self) -> AppResult<(u8, ProgressStatus)> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => validation_messages(&e),
        };

        if self.percentage.is_none() {
            errors.push("Percentage is required".to_string());
        }
        let status = match self.status.as_deref() {
            Some(s) => s.parse::<ProgressStatus>().map_err(|e| errors.push(e)).ok(),
            None => {
                errors.push("Status is required".to_string());
                None
            }
        };

        match (self.percentage, status) {
            (Some(p), Some(status)) if errors.is_empty() => Ok((p as u8, status)),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

/// Complete-via-operation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOperationRequest {
    pub loading_record_id: Option<String>,
}

/// Progress projection of a record
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub id: Uuid,
    pub dock: i32,
    pub sequence_number: i32,
    pub driver: Driver,
    pub progress: Progress,
    pub timestamps: RecordTimestamps,
}

impl From<LoadingRecord> for ProgressView {
    fn from(record: LoadingRecord) -> Self {
        Self {
            id: record.id,
            dock: record.dock,
            sequence_number: record.sequence_number,
            driver: record.driver,
            progress: record.progress,
            timestamps: record.timestamps,
        }
    }
}
