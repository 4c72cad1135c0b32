//! Integration tests for vrq-dr API endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - HTTP Basic authentication on protected routes
//! - Summary and raw results over a CSV result file
//! - Remote sink configuration (409)

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::util::ServiceExt;
use vrq_dr::{build_router, AppState};

const PASSWORD: &str = "review-me";

const RESULTS_CSV: &str = "\
question_number,left_img,right_img,group,choice,score,participant_id,timestamp
1,a.png,a.png,car,Completely Real / Normal / Natural,2,20250101_100000_000001,2025-01-01T10:05:00.000000Z
2,b.png,b.png,car,Looks edited but somewhat plausible,-1,20250101_100000_000001,2025-01-01T10:05:00.000000Z
1,c.png,c.png,truck,Completely Fake / Obviously Abnormal,-2,20250101_110000_000002,2025-01-01T11:02:00.000000Z
";

/// Test helper: temp dir holding a results.csv with three rows
fn results_file() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.csv");
    std::fs::write(&path, RESULTS_CSV).unwrap();
    (dir, path)
}

fn setup_app(results_path: Option<PathBuf>, password: Option<&str>) -> axum::Router {
    build_router(AppState::new(results_path, password))
}

fn basic_auth(password: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("admin:{}", password))
    )
}

fn authed_request(uri: &str, password: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(password))
        .body(Body::empty())
        .unwrap()
}

fn plain_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_app(None, None);

    let response = app.oneshot(plain_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "vrq-dr");
    assert_eq!(json["admin_enabled"], false);
}

#[tokio::test]
async fn test_protected_routes_locked_without_password() {
    let (_dir, path) = results_file();
    let app = setup_app(Some(path), None);

    for uri in ["/", "/api/summary", "/api/results"] {
        let response = app
            .clone()
            .oneshot(authed_request(uri, PASSWORD))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
    }
}

#[tokio::test]
async fn test_missing_credentials_challenge() {
    let (_dir, path) = results_file();
    let app = setup_app(Some(path), Some(PASSWORD));

    let response = app.oneshot(plain_request("/api/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let (_dir, path) = results_file();
    let app = setup_app(Some(path), Some(PASSWORD));

    let response = app
        .oneshot(authed_request("/api/summary", "guess"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Results
// =============================================================================

#[tokio::test]
async fn test_summary() {
    let (_dir, path) = results_file();
    let app = setup_app(Some(path), Some(PASSWORD));

    let response = app
        .oneshot(authed_request("/api/summary", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["total_rows"], 3);
    assert_eq!(json["participants"], 2);

    let groups = json["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["group"], "car");
    assert_eq!(groups[0]["responses"], 2);
    assert_eq!(groups[0]["mean_score"], 0.5);
    assert_eq!(groups[0]["min_score"], -1);
    assert_eq!(groups[0]["max_score"], 2);
    assert_eq!(
        groups[0]["choice_counts"]["Completely Real / Normal / Natural"],
        1
    );
    assert_eq!(groups[1]["group"], "truck");
    assert_eq!(groups[1]["mean_score"], -2.0);
}

#[tokio::test]
async fn test_results_rows() {
    let (_dir, path) = results_file();
    let app = setup_app(Some(path), Some(PASSWORD));

    let response = app
        .oneshot(authed_request("/api/results", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["group"], "truck");
    assert_eq!(rows[2]["score"], -2);
    assert_eq!(rows[0]["participant_id"], "20250101_100000_000001");
}

#[tokio::test]
async fn test_missing_results_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(Some(dir.path().join("results.csv")), Some(PASSWORD));

    let response = app
        .oneshot(authed_request("/api/summary", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["total_rows"], 0);
    assert_eq!(json["groups"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_remote_sink_conflict() {
    let app = setup_app(None, Some(PASSWORD));

    let response = app
        .oneshot(authed_request("/api/summary", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "REMOTE_SINK");
}

#[tokio::test]
async fn test_index_page() {
    let (_dir, path) = results_file();
    let app = setup_app(Some(path), Some(PASSWORD));

    let response = app.oneshot(authed_request("/", PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/api/summary"));
    assert!(html.contains("summary.choice_labels"));
    assert!(!html.contains("summary.groups[0]"));
}

#[tokio::test]
async fn test_summary_labels_include_later_groups() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.csv");
    let csv = format!(
        "{}1,d.png,d.png,van,Completely Real/Normal/Natural,2,20250101_120000_000003,2025-01-01T12:01:00.000000Z\n",
        RESULTS_CSV
    );
    std::fs::write(&path, csv).unwrap();
    let app = setup_app(Some(path), Some(PASSWORD));

    let response = app
        .oneshot(authed_request("/api/summary", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["groups"][0]["group"], "car");
    assert!(json["groups"][0]["choice_counts"]
        .get("Completely Real/Normal/Natural")
        .is_none());

    let labels: Vec<&str> = json["choice_labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|label| label.as_str().unwrap())
        .collect();
    assert_eq!(labels.len(), 5);
    assert_eq!(labels[0], "Completely Real / Normal / Natural");
    assert!(labels.contains(&"Completely Real/Normal/Natural"));
}
