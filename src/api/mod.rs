//! API handlers for DockTrack REST endpoints

pub mod dashboard;
pub mod forecasts;
pub mod health;
pub mod loading_records;
pub mod openapi;
pub mod operation;
pub mod stats;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// Success envelope: `{ success: true, message?, data }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            message: None,
            data,
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            message: Some(message.into()),
            data,
        })
    }
}

/// JSON body extractor reporting malformed bodies through the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor reporting bad parameters through the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Loading record id from the path. Anything that is not a UUID cannot name a record.
pub struct RecordId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("Loading record not found".to_string()))?;

        Uuid::parse_str(raw.trim())
            .map(RecordId)
            .map_err(|_| AppError::NotFound(format!("Loading record {} not found", raw)))
    }
}
