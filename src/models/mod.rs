//! Data models for DockTrack

pub mod enums;
pub mod loading_record;
pub mod progress;
pub mod shift;
pub mod shift_forecast;

// Re-export commonly used types
pub use enums::{LifecycleStatus, ProgressStatus, VehicleType};
pub use loading_record::{LoadingRecord, ProgressView};
pub use progress::{compute_progress, Progress, ProgressEntry, Schedule};
pub use shift::{resolve_shift, OperationClock, OperationMoment, ShiftCode};
pub use shift_forecast::{estimate_forecast, ShiftForecast};
