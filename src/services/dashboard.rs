//! Dashboard service

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

use crate::{
    api::dashboard::{CargoTotals, Dashboard, DashboardStats, DockStatus, DockView},
    error::AppResult,
    models::{loading_record::MAX_DOCK, LifecycleStatus, LoadingRecord, OperationClock},
    repository::Repository,
};

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
    clock: OperationClock,
}

impl DashboardService {
    pub fn new(repository: Repository, clock: OperationClock) -> Self {
        Self { repository, clock }
    }

    /// Dashboard of an operation day (today by default)
    pub async fn dashboard(&self, date: Option<NaiveDate>) -> AppResult<Dashboard> {
        let now = self.clock.now();
        let date = date.unwrap_or(now.day);
        let records = self.repository.loading_records.list_for_day(date, true).await?;

        let local = self.clock.local_time(now.at);
        let now_minutes = i64::from(local.hour() * 60 + local.minute());
        Ok(build_dashboard(date, &records, now_minutes, now.at))
    }
}

/// Minutes since midnight of an "HH:MM" mark
pub fn parse_clock(mark: &str) -> Option<i64> {
    NaiveTime::parse_from_str(mark.trim(), "%H:%M")
        .ok()
        .map(|t| i64::from(t.hour() * 60 + t.minute()))
}

/// "HH:MM"
pub fn format_clock(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Duration between two schedule marks, "00:00" when missing or negative
pub fn schedule_span(start: Option<&str>, end: Option<&str>) -> String {
    match (start.and_then(parse_clock), end.and_then(parse_clock)) {
        (Some(s), Some(e)) if e >= s => format_clock(e - s),
        _ => "00:00".to_string(),
    }
}

pub fn dock_status(status: LifecycleStatus) -> DockStatus {
    match status {
        LifecycleStatus::InUse => DockStatus::Occupied,
        LifecycleStatus::Released | LifecycleStatus::Completed => DockStatus::Released,
        LifecycleStatus::Pending | LifecycleStatus::Cancelled => DockStatus::Available,
    }
}

pub fn dock_view(record: &LoadingRecord) -> DockView {
    let driver = if record.driver.name.trim().is_empty() {
        "N/A".to_string()
    } else {
        record.driver.name.clone()
    };

    DockView {
        id: record.id,
        dock: record.dock,
        status: dock_status(record.lifecycle_status),
        driver,
        destination_city: record.destination_city.clone(),
        display_plate: record.plates.display(record.vehicle_type),
        vehicle_type: record.vehicle_type,
        plates: record.plates.clone(),
        entry_time: record.schedule.docked_at.clone(),
        exit_time: record.schedule.released_at.clone(),
        total_time: schedule_span(
            record.schedule.docked_at.as_deref(),
            record.schedule.released_at.as_deref(),
        ),
        cargo: record.cargo,
        sequence_number: record.sequence_number,
        schedule: record.schedule.clone(),
        seals: record.seals.clone(),
        created_at: record.timestamps.created_at,
    }
}

/// Mean time since docking over occupied docks that have a docking mark
pub fn average_time_since_docking(docks: &[DockView], now_minutes: i64) -> String {
    let starts: Vec<i64> = docks
        .iter()
        .filter(|d| d.status == DockStatus::Occupied)
        .filter_map(|d| d.entry_time.as_deref().and_then(parse_clock))
        .collect();

    if starts.is_empty() {
        return "00:00".to_string();
    }

    let total: i64 = starts.iter().map(|s| (now_minutes - s).max(0)).sum();
    format_clock(total / starts.len() as i64)
}

/// released / (released + in use) in percent, rounded, capped at 100
pub fn efficiency(released: i64, in_use: i64) -> u8 {
    let processed = released + in_use;
    if processed == 0 {
        return 0;
    }
    (released as f64 / processed as f64 * 100.0).round().min(100.0) as u8
}

pub fn build_dashboard(
    date: NaiveDate,
    records: &[LoadingRecord],
    now_minutes: i64,
    generated_at: DateTime<Utc>,
) -> Dashboard {
    let docks: Vec<DockView> = records.iter().map(dock_view).collect();

    let in_use = docks.iter().filter(|d| d.status == DockStatus::Occupied).count() as i64;
    let released = docks.iter().filter(|d| d.status == DockStatus::Released).count() as i64;

    let cargo_totals = docks.iter().fold(CargoTotals::default(), |mut acc, d| {
        acc.cages += u64::from(d.cargo.cages);
        acc.bulky_items += u64::from(d.cargo.bulky_items);
        acc.pallet_sleeves += u64::from(d.cargo.pallet_sleeves);
        acc
    });

    Dashboard {
        date,
        stats: DashboardStats {
            docks_in_use: in_use,
            released_routes: released,
            docks_available: (i64::from(MAX_DOCK) - in_use).max(0),
            average_time: average_time_since_docking(&docks, now_minutes),
            efficiency: efficiency(released, in_use),
            cargo_totals,
        },
        total_records: docks.len() as i64,
        docks,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loading_record::CreateLoadingRecord;
    use chrono::TimeZone;

    fn record(dock: i32, body: serde_json::Value) -> LoadingRecord {
        let mut json = serde_json::json!({
            "dock": dock,
            "destinationCity": "Juazeiro - BA",
            "driver": "Maria",
            "plates": { "simplePlate": "ABC1D23" }
        });
        if let (Some(base), Some(extra)) = (json.as_object_mut(), body.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let input: CreateLoadingRecord = serde_json::from_value(json).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        LoadingRecord::new(input, &OperationClock::from_offset_hours(-3).moment_at(at), "system")
    }

    #[test]
    fn test_schedule_span() {
        assert_eq!(schedule_span(Some("08:15"), Some("10:05")), "01:50");
        assert_eq!(schedule_span(Some("10:00"), Some("09:00")), "00:00");
        assert_eq!(schedule_span(Some("8h"), Some("09:00")), "00:00");
        assert_eq!(schedule_span(None, Some("09:00")), "00:00");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(dock_status(LifecycleStatus::InUse), DockStatus::Occupied);
        assert_eq!(dock_status(LifecycleStatus::Completed), DockStatus::Released);
        assert_eq!(dock_status(LifecycleStatus::Released), DockStatus::Released);
        assert_eq!(dock_status(LifecycleStatus::Cancelled), DockStatus::Available);
    }

    #[test]
    fn test_efficiency() {
        assert_eq!(efficiency(0, 0), 0);
        assert_eq!(efficiency(1, 2), 33);
        assert_eq!(efficiency(2, 1), 67);
        assert_eq!(efficiency(3, 0), 100);
    }

    #[test]
    fn test_bodywork_display_plate() {
        let r = record(
            4,
            serde_json::json!({
                "vehicleType": "BODYWORK",
                "plates": { "tractorPlate": "TRC1A23", "boxPlate": "BOX9Z87" }
            }),
        );
        assert_eq!(dock_view(&r).display_plate, "TRC1A23 / BOX9Z87");
    }

    #[test]
    fn test_build_dashboard() {
        let occupied = record(
            1,
            serde_json::json!({
                "schedule": { "dockedAt": "08:00" },
                "cargo": { "cages": 3, "bulkyItems": 1 }
            }),
        );
        let mut released = record(
            2,
            serde_json::json!({
                "schedule": { "dockedAt": "07:00", "releasedAt": "08:30" },
                "cargo": { "palletSleeves": 2 }
            }),
        );
        released.lifecycle_status = LifecycleStatus::Released;

        // now = 09:30 local
        let dashboard = build_dashboard(
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            &[occupied, released],
            9 * 60 + 30,
            Utc::now(),
        );

        assert_eq!(dashboard.stats.docks_in_use, 1);
        assert_eq!(dashboard.stats.released_routes, 1);
        assert_eq!(dashboard.stats.docks_available, 19);
        assert_eq!(dashboard.stats.average_time, "01:30");
        assert_eq!(dashboard.stats.efficiency, 50);
        assert_eq!(
            dashboard.stats.cargo_totals,
            CargoTotals {
                cages: 3,
                bulky_items: 1,
                pallet_sleeves: 2
            }
        );
        assert_eq!(dashboard.docks[1].total_time, "01:30");
        assert_eq!(dashboard.total_records, 2);
    }
}
