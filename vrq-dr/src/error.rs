//! Error types for vrq-dr

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Results are not stored locally (409)
    #[error("Results are sent to a remote form endpoint and cannot be read back here")]
    RemoteSink,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// vrq-common error
    #[error("Common error: {0}")]
    Common(#[from] vrq_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::RemoteSink => (
                StatusCode::CONFLICT,
                "REMOTE_SINK",
                "Results are sent to a remote form endpoint; review them there".to_string(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Common(ref err) => {
                tracing::error!("Failed to read results: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
