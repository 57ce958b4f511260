//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{dashboard, forecasts, health, loading_records, operation, stats};
use crate::models::{enums, loading_record, progress, shift, shift_forecast};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DockTrack API",
        version = "1.0.0",
        description = "Truck loading dock tracking REST API. Successful responses are wrapped in `{ success, message?, data }`.",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loading records
        loading_records::create_record,
        loading_records::list_records,
        loading_records::get_record,
        loading_records::update_record,
        loading_records::update_progress,
        loading_records::get_progress,
        loading_records::finalize_record,
        // Operation
        operation::complete,
        operation::progress,
        stats::get_statistics,
        // Forecasts
        forecasts::get_forecast,
        forecasts::upsert_forecast,
        forecasts::delete_forecast,
        // Dashboard
        dashboard::get_dashboard,
    ),
    components(
        schemas(
            // Enums
            enums::VehicleType,
            enums::ProgressStatus,
            enums::LifecycleStatus,
            shift::ShiftCode,
            // Loading records
            loading_record::LoadingRecord,
            loading_record::Driver,
            loading_record::Plates,
            loading_record::Seals,
            loading_record::SealsUpdate,
            loading_record::Cargo,
            loading_record::CargoUpdate,
            loading_record::RecordTimestamps,
            loading_record::RecordMetadata,
            loading_record::CreateLoadingRecord,
            loading_record::UpdateLoadingRecord,
            loading_record::ProgressUpdate,
            loading_record::CompleteOperationRequest,
            loading_record::ProgressView,
            progress::Schedule,
            progress::Progress,
            progress::ProgressEntry,
            // Forecasts
            shift_forecast::ShiftForecast,
            shift_forecast::UpsertForecast,
            shift_forecast::ForecastOperation,
            shift_forecast::ForecastUpsertResult,
            shift_forecast::ForecastLookup,
            forecasts::DeletedForecast,
            // Operation
            operation::OperationProgress,
            stats::OperationStatistics,
            stats::StatusCounts,
            stats::LifecycleCounts,
            stats::StageCounts,
            stats::CityShare,
            stats::AverageTime,
            stats::Completion,
            stats::DockSummary,
            stats::ActiveBucket,
            stats::ActiveRecordRow,
            // Dashboard
            dashboard::Dashboard,
            dashboard::DashboardStats,
            dashboard::DockView,
            dashboard::DockStatus,
            dashboard::CargoTotals,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorKind,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loading-records", description = "Loading records and their progress"),
        (name = "operation", description = "Overall operation progress and statistics"),
        (name = "forecasts", description = "Shift forecasts (also under /operation/forecast)"),
        (name = "dashboard", description = "Dock dashboard")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
