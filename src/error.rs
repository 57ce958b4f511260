//! Error types for DockTrack server

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;

/// Whether internal error details may be sent to clients. Set once at startup.
static EXPOSE_DETAILS: OnceCell<bool> = OnceCell::new();

/// Configure internal error detail exposure (non-production deployments only).
pub fn set_expose_details(expose: bool) {
    if EXPOSE_DETAILS.set(expose).is_err() {
        tracing::debug!("Error detail exposure already configured");
    }
}

fn expose_details() -> bool {
    EXPOSE_DETAILS.get().copied().unwrap_or(false)
}

/// Error kinds reported to API consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    ConflictError,
    PreconditionError,
    InternalError,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid data: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        occupied_by: Option<String>,
    },

    #[error("Precondition failed: {message}")]
    Precondition { message: String, missing: Vec<String> },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Single-message validation error
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::NotFound(_) => ErrorKind::NotFoundError,
            AppError::Conflict { .. } => ErrorKind::ConflictError,
            AppError::Precondition { .. } => ErrorKind::PreconditionError,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ValidationError
            | ErrorKind::ConflictError
            | ErrorKind::PreconditionError => StatusCode::BAD_REQUEST,
            ErrorKind::NotFoundError => StatusCode::NOT_FOUND,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(validation_messages(&errors))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

/// Flatten `validator` field errors into messages, ordered by field name.
pub fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {}", field),
            })
        })
        .collect()
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    pub error: ErrorKind,
    pub message: String,
    /// Itemized validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Schedule fields still blank (finalize precondition)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
    /// Driver currently holding the requested dock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupied_by: Option<String>,
    /// Internal failure detail (non-production only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            success: false,
            error: kind,
            message,
            errors: None,
            missing_fields: None,
            occupied_by: None,
            details: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let body = match self {
            AppError::Validation(errors) => ErrorResponse {
                errors: Some(errors),
                ..ErrorResponse::new(kind, "Invalid data".to_string())
            },
            AppError::NotFound(msg) => ErrorResponse::new(kind, msg),
            AppError::Conflict { message, occupied_by } => ErrorResponse {
                occupied_by,
                ..ErrorResponse::new(kind, message)
            },
            AppError::Precondition { message, missing } => ErrorResponse {
                missing_fields: Some(missing),
                ..ErrorResponse::new(kind, message)
            },
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorResponse {
                    details: expose_details().then(|| e.to_string()),
                    ..ErrorResponse::new(kind, "Internal server error".to_string())
                }
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorResponse {
                    details: expose_details().then_some(msg),
                    ..ErrorResponse::new(kind, "Internal server error".to_string())
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = tokio_test::block_on(axum::body::to_bytes(response.into_body(), usize::MAX))
            .expect("readable body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[test]
    fn test_validation_envelope_lists_every_message() {
        let (status, body) = render(AppError::Validation(vec![
            "Dock must be between 1 and 20".to_string(),
            "Destination city is required".to_string(),
        ]));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_conflict_names_occupying_driver() {
        let (status, body) = render(AppError::Conflict {
            message: "Dock 5 is already in use by Maria".to_string(),
            occupied_by: Some("Maria".to_string()),
        });

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ConflictError");
        assert_eq!(body["occupiedBy"], "Maria");
    }

    #[test]
    fn test_precondition_lists_missing_fields() {
        let (status, body) = render(AppError::Precondition {
            message: "All schedule times must be filled".to_string(),
            missing: vec!["releasedAt".to_string()],
        });

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["missingFields"][0], "releasedAt");
    }

    #[test]
    fn test_not_found_is_404() {
        let (status, body) = render(AppError::NotFound("Loading record x not found".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFoundError");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_internal_hides_details_by_default() {
        let (status, body) = render(AppError::Internal("pool timed out".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("details").is_none());
    }
}
