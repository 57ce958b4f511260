//! Dock dashboard endpoint

use axum::{extract::State, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        loading_record::{Cargo, Plates, Seals},
        Schedule, VehicleType,
    },
};

use super::{stats::parse_day, ApiQuery, ApiResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Operation day (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
}

/// Dock occupancy as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DockStatus {
    Occupied,
    Released,
    Available,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DockView {
    pub id: Uuid,
    pub dock: i32,
    pub status: DockStatus,
    pub driver: String,
    pub destination_city: String,
    /// "tractor / box" for BODYWORK, the single plate otherwise
    pub display_plate: String,
    pub vehicle_type: VehicleType,
    pub plates: Plates,
    /// Schedule mark of docking
    pub entry_time: Option<String>,
    /// Schedule mark of release
    pub exit_time: Option<String>,
    /// "HH:MM" between entry and exit
    pub total_time: String,
    pub cargo: Cargo,
    pub sequence_number: i32,
    pub schedule: Schedule,
    pub seals: Seals,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CargoTotals {
    pub cages: u64,
    pub bulky_items: u64,
    pub pallet_sleeves: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub docks_in_use: i64,
    pub released_routes: i64,
    pub docks_available: i64,
    /// Mean "HH:MM" since docking over occupied docks
    pub average_time: String,
    /// released / (released + in use), percent
    pub efficiency: u8,
    pub cargo_totals: CargoTotals,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub date: NaiveDate,
    pub stats: DashboardStats,
    pub docks: Vec<DockView>,
    pub total_records: i64,
    pub generated_at: DateTime<Utc>,
}

/// Per-dock view of an operation day
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard", body = Dashboard),
        (status = 400, description = "Invalid date", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let date = parse_day(query.date.as_deref())?;
    let dashboard = state.services.dashboard.dashboard(date).await?;
    Ok(ApiResponse::ok(dashboard))
}
