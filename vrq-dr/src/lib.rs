//! vrq-dr library - results review module
//!
//! Read-only admin view over the questionnaire result file.

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Local result file; `None` when results go to a remote endpoint
    pub results_path: Option<PathBuf>,
    /// SHA-256 of the admin password; `None` locks the protected routes
    pub password_digest: Option<[u8; 32]>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(results_path: Option<PathBuf>, admin_password: Option<&str>) -> Self {
        Self {
            results_path,
            password_digest: admin_password.map(api::auth::password_digest),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Health is public; everything else requires the admin password.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let protected = Router::new()
        .route("/", get(api::serve_index))
        .route("/api/summary", get(api::get_summary))
        .route("/api/results", get(api::get_results))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
