//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("vrq-qa")
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Question pairs available to sessions
    pub pool_size: usize,
    /// Sessions currently held in memory
    pub live_sessions: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "vrq-qa".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        pool_size: state.survey.pool().len(),
        live_sessions: state.sessions.len().await,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
