//! Operating shifts and the dock's local clock

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use std::str::FromStr;
use utoipa::ToSchema;

use super::enums::text_column;

/// One of the two daily operating windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ShiftCode {
    /// Morning shift, roughly 01:00-12:00
    #[serde(rename = "A", alias = "SBA02")]
    A,
    /// Afternoon shift, roughly 12:00-23:00
    #[serde(rename = "B", alias = "SBA04")]
    B,
}

impl ShiftCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftCode::A => "A",
            ShiftCode::B => "B",
        }
    }
}

impl FromStr for ShiftCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "SBA02" => Ok(ShiftCode::A),
            "B" | "SBA04" => Ok(ShiftCode::B),
            other => Err(format!("Invalid shift '{}'. Use A or B", other)),
        }
    }
}

text_column!(ShiftCode);

impl std::fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a local hour of day to its shift.
///
/// Hours 12..23 belong to shift B. Everything else (1..12, plus the
/// uncovered hours 0 and 23) falls back to shift A.
pub fn resolve_shift(hour: u32) -> ShiftCode {
    if (12..23).contains(&hour) {
        ShiftCode::B
    } else {
        ShiftCode::A
    }
}

/// A single reading of the operational clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationMoment {
    /// The instant itself, stored as UTC
    pub at: DateTime<Utc>,
    /// Calendar day in dock-local time
    pub day: NaiveDate,
    pub shift: ShiftCode,
}

/// Clock in the dock's fixed local offset
#[derive(Debug, Clone, Copy)]
pub struct OperationClock {
    offset: FixedOffset,
}

impl OperationClock {
    /// Build a clock for an offset in whole hours; out-of-range offsets fall back to UTC.
    pub fn from_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| {
            tracing::warn!("Invalid UTC offset {}h, using UTC", hours);
            Utc.fix()
        });
        Self { offset }
    }

    pub fn now(&self) -> OperationMoment {
        self.moment_at(Utc::now())
    }

    pub fn moment_at(&self, at: DateTime<Utc>) -> OperationMoment {
        let local = at.with_timezone(&self.offset);
        OperationMoment {
            at,
            day: local.date_naive(),
            shift: resolve_shift(local.hour()),
        }
    }

    /// Current local calendar day
    pub fn today(&self) -> NaiveDate {
        self.now().day
    }

    /// Local wall-clock time of an instant
    pub fn local_time(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_morning_hours_are_shift_a() {
        for hour in 1..12 {
            assert_eq!(resolve_shift(hour), ShiftCode::A, "hour {}", hour);
        }
    }

    #[test]
    fn test_afternoon_hours_are_shift_b() {
        for hour in 12..23 {
            assert_eq!(resolve_shift(hour), ShiftCode::B, "hour {}", hour);
        }
    }

    #[test]
    fn test_midnight_and_late_night_fall_back_to_a() {
        assert_eq!(resolve_shift(0), ShiftCode::A);
        assert_eq!(resolve_shift(23), ShiftCode::A);
    }

    #[test]
    fn test_legacy_shift_codes() {
        assert_eq!("SBA02".parse::<ShiftCode>(), Ok(ShiftCode::A));
        assert_eq!("SBA04".parse::<ShiftCode>(), Ok(ShiftCode::B));
        assert!("C".parse::<ShiftCode>().is_err());
        let parsed: ShiftCode = serde_json::from_str("\"SBA04\"").unwrap();
        assert_eq!(parsed, ShiftCode::B);
    }

    #[test]
    fn test_clock_uses_local_offset_for_day_and_shift() {
        let clock = OperationClock::from_offset_hours(-3);
        // 02:30 UTC is 23:30 of the previous day in UTC-3
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 2, 30, 0).unwrap();
        let moment = clock.moment_at(at);

        assert_eq!(moment.day, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(moment.shift, ShiftCode::A);

        // 15:00 UTC is 12:00 local
        let noon = clock.moment_at(Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap());
        assert_eq!(noon.shift, ShiftCode::B);
    }
}
