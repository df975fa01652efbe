// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The document store could not be reached. Transient; the whole event
    /// is safe to redeliver.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A specific insight document's update was rejected or timed out. The
    /// document is left at its pre-event state.
    #[error("Commit failed for insight {insight_id}: {message}")]
    Commit { insight_id: String, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            AppError::Commit {
                insight_id,
                message,
            } => {
                tracing::error!(insight_id = %insight_id, error = %message, "Commit failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "commit_failed")
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
