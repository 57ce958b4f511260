//! DockTrack loading dock server
//!
//! Tracks trucks through the loading docks of a distribution center:
//! loading records and their progress, shift forecasts, operation
//! statistics and the dock dashboard, served as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
