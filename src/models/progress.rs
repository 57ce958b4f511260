//! Loading progress: schedule-driven stage calculation and the history log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::enums::ProgressStatus;

/// Free-text time-of-day marks entered by the dock operator ("HH:MM")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub docked_at: Option<String>,
    #[serde(default)]
    pub loading_started_at: Option<String>,
    #[serde(default)]
    pub loading_finished_at: Option<String>,
    #[serde(default)]
    pub released_at: Option<String>,
}

/// The four schedule marks, in stage order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleField {
    DockedAt,
    LoadingStartedAt,
    LoadingFinishedAt,
    ReleasedAt,
}

impl ScheduleField {
    pub const ALL: [ScheduleField; 4] = [
        ScheduleField::DockedAt,
        ScheduleField::LoadingStartedAt,
        ScheduleField::LoadingFinishedAt,
        ScheduleField::ReleasedAt,
    ];

    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleField::DockedAt => "dockedAt",
            ScheduleField::LoadingStartedAt => "loadingStartedAt",
            ScheduleField::LoadingFinishedAt => "loadingFinishedAt",
            ScheduleField::ReleasedAt => "releasedAt",
        }
    }

    /// Stage reached once this mark is present
    pub fn stage(&self) -> ProgressStatus {
        match self {
            ScheduleField::DockedAt => ProgressStatus::Docked,
            ScheduleField::LoadingStartedAt => ProgressStatus::Loading,
            ScheduleField::LoadingFinishedAt => ProgressStatus::Finished,
            ScheduleField::ReleasedAt => ProgressStatus::Released,
        }
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl Schedule {
    pub fn get(&self, field: ScheduleField) -> &Option<String> {
        match field {
            ScheduleField::DockedAt => &self.docked_at,
            ScheduleField::LoadingStartedAt => &self.loading_started_at,
            ScheduleField::LoadingFinishedAt => &self.loading_finished_at,
            ScheduleField::ReleasedAt => &self.released_at,
        }
    }

    pub fn get_mut(&mut self, field: ScheduleField) -> &mut Option<String> {
        match field {
            ScheduleField::DockedAt => &mut self.docked_at,
            ScheduleField::LoadingStartedAt => &mut self.loading_started_at,
            ScheduleField::LoadingFinishedAt => &mut self.loading_finished_at,
            ScheduleField::ReleasedAt => &mut self.released_at,
        }
    }

    pub fn is_filled(&self, field: ScheduleField) -> bool {
        !is_blank(self.get(field))
    }

    /// Fields holding a non-blank value, in stage order
    pub fn filled_fields(&self) -> Vec<ScheduleField> {
        ScheduleField::ALL
            .into_iter()
            .filter(|f| self.is_filled(*f))
            .collect()
    }

    /// Fields still blank, in stage order
    pub fn missing_fields(&self) -> Vec<ScheduleField> {
        ScheduleField::ALL
            .into_iter()
            .filter(|f| !self.is_filled(*f))
            .collect()
    }
}

/// Derive (percentage, stage) from the most advanced schedule mark present.
///
/// Earlier marks are not required: a schedule with only `loadingFinishedAt`
/// is at 75% / finished.
pub fn compute_progress(schedule: &Schedule) -> (u8, ProgressStatus) {
    let stage = ScheduleField::ALL
        .into_iter()
        .rev()
        .find(|f| schedule.is_filled(*f))
        .map(|f| f.stage())
        .unwrap_or(ProgressStatus::Queued);
    (stage.percentage(), stage)
}

/// One entry of the append-only progress log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub percentage: u8,
    pub status: ProgressStatus,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Progress sub-document of a loading record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub percentage: u8,
    pub status: ProgressStatus,
    pub last_updated_at: DateTime<Utc>,
    pub history: Vec<ProgressEntry>,
}

impl Progress {
    /// Start a progress log at the given stage
    pub fn start(percentage: u8, status: ProgressStatus, description: String, at: DateTime<Utc>) -> Self {
        Self {
            percentage,
            status,
            last_updated_at: at,
            history: vec![ProgressEntry {
                percentage,
                status,
                timestamp: at,
                description,
            }],
        }
    }

    /// Move to a new (percentage, status) and append the matching history entry
    pub fn record(&mut self, percentage: u8, status: ProgressStatus, description: String, at: DateTime<Utc>) {
        self.percentage = percentage;
        self.status = status;
        self.last_updated_at = at;
        self.history.push(ProgressEntry {
            percentage,
            status,
            timestamp: at,
            description,
        });
    }

    /// Progress counts as done at (100, released)
    pub fn is_released(&self) -> bool {
        self.percentage == 100 && self.status == ProgressStatus::Released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(docked: &str, started: &str, finished: &str, released: &str) -> Schedule {
        let opt = |v: &str| Some(v.to_string());
        Schedule {
            docked_at: opt(docked),
            loading_started_at: opt(started),
            loading_finished_at: opt(finished),
            released_at: opt(released),
        }
    }

    #[test]
    fn test_empty_schedule_is_queued() {
        assert_eq!(compute_progress(&Schedule::default()), (0, ProgressStatus::Queued));
        assert_eq!(compute_progress(&schedule("", " ", "", "")), (0, ProgressStatus::Queued));
    }

    #[test]
    fn test_each_stage_percentage() {
        assert_eq!(compute_progress(&schedule("08:00", "", "", "")), (25, ProgressStatus::Docked));
        assert_eq!(compute_progress(&schedule("08:00", "08:10", "", "")), (50, ProgressStatus::Loading));
        assert_eq!(
            compute_progress(&schedule("08:00", "08:10", "09:00", "")),
            (75, ProgressStatus::Finished)
        );
        assert_eq!(
            compute_progress(&schedule("08:00", "08:10", "09:00", "09:15")),
            (100, ProgressStatus::Released)
        );
    }

    #[test]
    fn test_most_advanced_mark_wins_without_earlier_marks() {
        assert_eq!(compute_progress(&schedule("", "", "09:00", "")), (75, ProgressStatus::Finished));
        assert_eq!(compute_progress(&schedule("", "", "", "10:00")), (100, ProgressStatus::Released));
    }

    #[test]
    fn test_filled_and_missing_fields() {
        let s = schedule("08:00", "", "09:00", "  ");
        assert_eq!(s.filled_fields(), vec![ScheduleField::DockedAt, ScheduleField::LoadingFinishedAt]);
        let missing: Vec<_> = s.missing_fields().iter().map(|f| f.name()).collect();
        assert_eq!(missing, vec!["loadingStartedAt", "releasedAt"]);
    }

    #[test]
    fn test_record_appends_without_touching_earlier_entries() {
        let t0 = Utc::now();
        let mut progress = Progress::start(0, ProgressStatus::Queued, "queued".into(), t0);
        let first = progress.history[0].clone();

        progress.record(50, ProgressStatus::Loading, "loading".into(), t0);
        progress.record(100, ProgressStatus::Released, "done".into(), t0);

        assert_eq!(progress.history.len(), 3);
        assert_eq!(progress.history[0], first);
        assert!(progress.is_released());
    }
}
