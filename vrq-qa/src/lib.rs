//! vrq-qa library - participant questionnaire service
//!
//! Exposes the router and state for the binary and for integration tests.

pub mod api;
pub mod error;
pub mod sessions;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use vrq_common::Survey;

use crate::sessions::SessionRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Question pool + result sink
    pub survey: Survey,
    /// Live participant sessions
    pub sessions: SessionRegistry,
    /// Plain image root, served under /images/plain
    pub image_dir: PathBuf,
    /// Annotated image root, served under /images/annotated
    pub annotated_image_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        survey: Survey,
        sessions: SessionRegistry,
        image_dir: PathBuf,
        annotated_image_dir: PathBuf,
    ) -> Self {
        Self {
            survey,
            sessions,
            image_dir,
            annotated_image_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let plain_images = ServeDir::new(&state.image_dir);
    let annotated_images = ServeDir::new(&state.annotated_image_dir);

    Router::new()
        .merge(api::survey_routes())
        .merge(api::health_routes())
        .nest_service("/images/plain", plain_images)
        .nest_service("/images/annotated", annotated_images)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
