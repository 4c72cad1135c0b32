//! Error types for vrq-qa
//!
//! Participants see HTML, so errors render as a small page rather than JSON.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::api::pages;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown or expired session (404)
    #[error("Session not found")]
    SessionNotFound,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            ApiError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "Session not found",
                "This questionnaire session has expired or does not exist.",
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "Please try again later.",
                )
            }
        };

        (status, Html(pages::message_page(title, message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
