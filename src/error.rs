//! Error types for songdeck
//!
//! Every handler failure renders as the uniform envelope
//! `{"success": false, "status": ..., "message": ...}`. Store errors are
//! logged server-side and surfaced to clients as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Convenience Result type using the songdeck Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the catalog service
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range request input
    #[error("{0}")]
    Validation(String),

    /// Write rejected because it would collide with an existing record
    #[error("{0}")]
    Conflict(String),

    /// Operation on a nonexistent record or connection
    #[error("{0}")]
    NotFound(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fallback for anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status for this error category
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Store and internal failures stay opaque.
    fn client_message(&self) -> String {
        match self {
            Error::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database operation failed".to_string()
            }
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                "Internal Server Error".to_string()
            }
            Error::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();
        // "fail" marks client errors, "error" marks server-side failures
        let label = if status.is_client_error() { "fail" } else { "error" };

        let body = Json(json!({
            "success": false,
            "status": label,
            "message": message,
        }));

        (status, body).into_response()
    }
}
