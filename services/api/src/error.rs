//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use learntrack_core::ports::PortError;
use serde_json::json;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Converts the error into a JSON response with the appropriate status code.
///
/// The body always has the shape `{"error": {"kind": ..., "message": ...}}`
/// where `kind` is a stable machine-readable name clients can match on.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Port(port_error) => {
                let status = match &port_error {
                    PortError::CourseNotFound(_)
                    | PortError::LessonNotFound(_)
                    | PortError::QuizNotFound(_) => StatusCode::NOT_FOUND,
                    PortError::AlreadyEnrolled { .. } => StatusCode::CONFLICT,
                    PortError::NotEnrolled { .. } => StatusCode::FORBIDDEN,
                    PortError::MalformedSubmission { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    PortError::AttemptLimitReached { .. } => StatusCode::CONFLICT,
                    PortError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                if status == StatusCode::SERVICE_UNAVAILABLE {
                    error!("Store unavailable: {}", port_error);
                }
                (status, port_error.kind(), port_error.to_string())
            }
            other => {
                error!("Internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "kind": kind,
                "message": message,
            }
        }));
        (status, body).into_response()
    }
}
