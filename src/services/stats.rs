//! Statistics service: day aggregation and operation progress

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::{
    api::{
        operation::OperationProgress,
        stats::{
            ActiveBucket, ActiveRecordRow, AverageTime, CityShare, Completion, DockSummary,
            OperationStatistics, StatusCounts,
        },
    },
    error::AppResult,
    models::{
        LifecycleStatus, LoadingRecord, OperationClock, OperationMoment, ProgressStatus, ShiftCode,
    },
    repository::Repository,
};

use super::forecasts::ForecastsService;

/// Rows listed in the operation table
pub const ACTIVE_RECORDS_LIMIT: usize = 10;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    forecasts: ForecastsService,
    clock: OperationClock,
}

impl StatsService {
    pub fn new(repository: Repository, forecasts: ForecastsService, clock: OperationClock) -> Self {
        Self {
            repository,
            forecasts,
            clock,
        }
    }

    /// Aggregate the non-cancelled records of a day.
    ///
    /// `day` defaults to today and `shift` to the current shift. Completion
    /// is measured for the records of that shift against its forecast.
    pub async fn statistics(
        &self,
        day: Option<NaiveDate>,
        shift: Option<ShiftCode>,
    ) -> AppResult<OperationStatistics> {
        let now = self.clock.now();
        let day = day.unwrap_or(now.day);
        let shift = shift.unwrap_or(now.shift);

        let records = self.repository.loading_records.list_for_day(day, false).await?;
        let forecast = self.forecasts.total_for(day, shift).await?;

        let completed = records
            .iter()
            .filter(|r| r.metadata.shift == shift && r.is_completed())
            .count() as i64;
        let cities = group_by_city(&records);

        Ok(OperationStatistics {
            day,
            shift,
            total_forecast: forecast.total,
            forecast_estimated: forecast.estimated,
            statistics: count_statuses(&records),
            top_city: cities.first().cloned(),
            cities,
            average_time: average_release_time(&records),
            completion: Completion {
                completed,
                percentage: completion_percentage(completed, forecast.total),
            },
            docks: dock_breakdown(&records),
            active_records: active_records(&records, &self.clock, now.at),
        })
    }

    /// Completed vs forecast for the current shift.
    ///
    /// Never fails: storage errors degrade to a default payload so that
    /// dashboard polling keeps working.
    pub async fn operation_progress(&self) -> OperationProgress {
        let now = self.clock.now();
        match self.try_operation_progress(&now).await {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!(error = %e, shift = %now.shift, "Operation progress degraded to defaults");
                OperationProgress::fallback(now.shift, now.at)
            }
        }
    }

    async fn try_operation_progress(&self, now: &OperationMoment) -> AppResult<OperationProgress> {
        let forecast = self.forecasts.total_for(now.day, now.shift).await?;
        let completed = self
            .repository
            .loading_records
            .count_completed(now.day, now.shift)
            .await?;

        Ok(OperationProgress {
            total_forecast: forecast.total,
            forecast_estimated: forecast.estimated,
            completed,
            percentage: completion_percentage(completed, forecast.total),
            pending: (forecast.total - completed).max(0),
            shift: now.shift,
            last_updated_at: now.at,
        })
    }
}

/// Completed share of a forecast, rounded and clamped to [0, 100]
pub fn completion_percentage(completed: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Counts by lifecycle status and by progress stage
pub fn count_statuses(records: &[LoadingRecord]) -> StatusCounts {
    let mut counts = StatusCounts {
        total: records.len() as i64,
        ..Default::default()
    };

    for record in records {
        match record.lifecycle_status {
            LifecycleStatus::Pending => counts.by_lifecycle.pending += 1,
            LifecycleStatus::InUse => counts.by_lifecycle.in_use += 1,
            LifecycleStatus::Completed => counts.by_lifecycle.completed += 1,
            LifecycleStatus::Released => counts.by_lifecycle.released += 1,
            LifecycleStatus::Cancelled => {}
        }
        if record.lifecycle_status == LifecycleStatus::Completed && record.metadata.finalized_by_button {
            counts.finalized_by_button += 1;
        }
        match record.progress.status {
            ProgressStatus::Queued => counts.by_stage.queued += 1,
            ProgressStatus::Docked => counts.by_stage.docked += 1,
            ProgressStatus::Loading => counts.by_stage.loading += 1,
            ProgressStatus::Finished => counts.by_stage.finished += 1,
            ProgressStatus::Released => counts.by_stage.released += 1,
        }
    }

    counts
}

/// Group records by destination city, largest first (ties keep first-seen order)
pub fn group_by_city(records: &[LoadingRecord]) -> Vec<CityShare> {
    let total = records.len() as f64;
    let mut groups: IndexMap<&str, CityShare> = IndexMap::new();

    for record in records {
        let city = groups
            .entry(record.destination_city.as_str())
            .or_insert_with(|| CityShare {
                name: record.destination_city.clone(),
                quantity: 0,
                cargo_types: Vec::new(),
                percentage: 0.0,
            });
        city.quantity += 1;
        for kind in record.cargo.kinds() {
            if !city.cargo_types.iter().any(|k| k == kind) {
                city.cargo_types.push(kind.to_string());
            }
        }
    }

    let mut cities: Vec<CityShare> = groups
        .into_values()
        .map(|mut city| {
            city.percentage = if total > 0.0 {
                round1(city.quantity as f64 / total * 100.0)
            } else {
                0.0
            };
            city
        })
        .collect();
    cities.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    cities
}

/// "Hh Mm"
pub fn format_hours_minutes(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Mean minutes from registration to release over released records
pub fn average_release_time(records: &[LoadingRecord]) -> AverageTime {
    let durations: Vec<f64> = records
        .iter()
        .filter_map(|r| {
            r.timestamps
                .released_at
                .map(|released| (released - r.timestamps.created_at).num_seconds() as f64 / 60.0)
        })
        .collect();

    if durations.is_empty() {
        return AverageTime {
            minutes: 0,
            formatted: "N/A".to_string(),
        };
    }

    let minutes = (durations.iter().sum::<f64>() / durations.len() as f64).round() as i64;
    AverageTime {
        minutes,
        formatted: format_hours_minutes(minutes),
    }
}

/// Per-dock totals, ordered by dock
pub fn dock_breakdown(records: &[LoadingRecord]) -> Vec<DockSummary> {
    let mut docks: BTreeMap<i32, (i64, i64, u64)> = BTreeMap::new();
    for record in records {
        let entry = docks.entry(record.dock).or_default();
        entry.0 += 1;
        if record.is_completed() {
            entry.1 += 1;
        }
        entry.2 += u64::from(record.progress.percentage);
    }

    docks
        .into_iter()
        .map(|(dock, (total, completed, progress_sum))| DockSummary {
            dock,
            total,
            completed,
            average_progress: round1(progress_sum as f64 / total as f64),
        })
        .collect()
}

/// Time elapsed since registration: "Xh Ym", or "Ym" under an hour
pub fn waiting_time(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - since).num_minutes().max(0);
    if minutes >= 60 {
        format_hours_minutes(minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn bucket(status: ProgressStatus) -> ActiveBucket {
    match status {
        ProgressStatus::Released => ActiveBucket::Complete,
        ProgressStatus::Loading | ProgressStatus::Finished => ActiveBucket::InProgress,
        ProgressStatus::Queued | ProgressStatus::Docked => ActiveBucket::Waiting,
    }
}

/// Operation table rows for the first records of the day
pub fn active_records(
    records: &[LoadingRecord],
    clock: &OperationClock,
    now: DateTime<Utc>,
) -> Vec<ActiveRecordRow> {
    records
        .iter()
        .filter(|r| r.lifecycle_status != LifecycleStatus::Cancelled)
        .take(ACTIVE_RECORDS_LIMIT)
        .map(|r| {
            let plate = r
                .plates
                .simple_plate
                .as_ref()
                .or(r.plates.tractor_plate.as_ref())
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| "N/A".to_string());
            let kinds = r.cargo.kinds();

            ActiveRecordRow {
                id: r.id,
                plate,
                status: bucket(r.progress.status),
                destination_city: r.destination_city.clone(),
                vehicle_type: r.vehicle_type,
                cargo: if kinds.is_empty() {
                    "N/A".to_string()
                } else {
                    kinds.join(", ")
                },
                entry_time: clock.local_time(r.timestamps.created_at).format("%H:%M").to_string(),
                waiting_time: waiting_time(r.timestamps.created_at, now),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loading_record::{Cargo, CreateLoadingRecord};
    use chrono::{Duration, TimeZone};

    fn clock() -> OperationClock {
        OperationClock::from_offset_hours(-3)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 11, 0, 0).unwrap()
    }

    fn record(dock: i32, city: &str, cargo: Cargo) -> LoadingRecord {
        let input: CreateLoadingRecord = serde_json::from_value(serde_json::json!({
            "dock": dock,
            "destinationCity": city,
            "driver": format!("Driver {}", dock),
            "plates": { "simplePlate": format!("ABC{}D23", dock) }
        }))
        .unwrap();
        let mut record = LoadingRecord::new(input, &clock().moment_at(t0()), "system");
        record.cargo = cargo;
        record
    }

    fn cages(n: u32) -> Cargo {
        Cargo {
            cages: n,
            ..Default::default()
        }
    }

    /// One released, one in progress, one queued
    fn three_records() -> Vec<LoadingRecord> {
        let mut released = record(1, "Juazeiro - BA", cages(2));
        released.complete(t0() + Duration::minutes(95));

        let mut loading = record(2, "Salvador - BA", Cargo {
            bulky_items: 1,
            ..Default::default()
        });
        loading
            .apply_progress(50, ProgressStatus::Loading, None, t0(), true)
            .unwrap();

        let queued = record(3, "Juazeiro - BA", Cargo {
            pallet_sleeves: 4,
            ..Default::default()
        });

        vec![released, loading, queued]
    }

    #[test]
    fn test_counts_for_three_records() {
        let counts = count_statuses(&three_records());
        assert_eq!(counts.total, 3);
        assert_eq!(counts.by_lifecycle.completed, 1);
        assert_eq!(counts.by_lifecycle.in_use, 2);
        assert_eq!(counts.by_stage.released, 1);
        assert_eq!(counts.by_stage.loading, 1);
        assert_eq!(counts.by_stage.queued, 1);
        assert_eq!(counts.finalized_by_button, 0);
    }

    #[test]
    fn test_city_grouping_sums_to_total() {
        let records = three_records();
        let cities = group_by_city(&records);

        assert_eq!(cities.iter().map(|c| c.quantity).sum::<i64>(), 3);
        assert_eq!(cities[0].name, "Juazeiro - BA");
        assert_eq!(cities[0].quantity, 2);
        assert_eq!(cities[0].percentage, 66.7);
        assert_eq!(cities[0].cargo_types, vec!["Cages", "Pallet sleeves"]);
        assert_eq!(cities[1].percentage, 33.3);
    }

    #[test]
    fn test_city_ties_keep_first_seen_order() {
        let records = vec![
            record(1, "Feira de Santana - BA", Cargo::default()),
            record(2, "Alagoinhas - BA", Cargo::default()),
        ];
        let names: Vec<_> = group_by_city(&records).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Feira de Santana - BA", "Alagoinhas - BA"]);
    }

    #[test]
    fn test_average_release_time() {
        let average = average_release_time(&three_records());
        assert_eq!(average.minutes, 95);
        assert_eq!(average.formatted, "1h 35m");

        let none = average_release_time(&[record(1, "X", Cargo::default())]);
        assert_eq!(none.formatted, "N/A");
        assert_eq!(none.minutes, 0);
    }

    #[test]
    fn test_completion_percentage_is_clamped() {
        assert_eq!(completion_percentage(0, 15), 0);
        assert_eq!(completion_percentage(5, 20), 25);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(30, 20), 100);
        assert_eq!(completion_percentage(3, 0), 0);
    }

    #[test]
    fn test_dock_breakdown() {
        let mut records = three_records();
        let mut second_on_dock_1 = record(1, "Juazeiro - BA", Cargo::default());
        second_on_dock_1
            .apply_progress(25, ProgressStatus::Docked, None, t0(), true)
            .unwrap();
        records.push(second_on_dock_1);

        let docks = dock_breakdown(&records);
        assert_eq!(docks.len(), 3);
        assert_eq!(docks[0].dock, 1);
        assert_eq!(docks[0].total, 2);
        assert_eq!(docks[0].completed, 1);
        assert_eq!(docks[0].average_progress, 62.5);
    }

    #[test]
    fn test_waiting_time_format() {
        assert_eq!(waiting_time(t0(), t0() + Duration::minutes(42)), "42m");
        assert_eq!(waiting_time(t0(), t0() + Duration::minutes(125)), "2h 5m");
        assert_eq!(waiting_time(t0(), t0() - Duration::minutes(5)), "0m");
    }

    #[test]
    fn test_active_records_rows() {
        let rows = active_records(&three_records(), &clock(), t0() + Duration::minutes(30));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].status, ActiveBucket::Complete);
        assert_eq!(rows[1].status, ActiveBucket::InProgress);
        assert_eq!(rows[2].status, ActiveBucket::Waiting);
        assert_eq!(rows[0].cargo, "Cages");
        // 11:00 UTC is 08:00 in UTC-3
        assert_eq!(rows[0].entry_time, "08:00");
        assert_eq!(rows[0].waiting_time, "30m");
    }

    #[test]
    fn test_active_records_are_capped() {
        let records: Vec<_> = (1..=12).map(|d| record(d, "X", Cargo::default())).collect();
        assert_eq!(active_records(&records, &clock(), t0()).len(), ACTIVE_RECORDS_LIMIT);
    }
}
