//! Result summary endpoints
//!
//! Reads the CSV result file and aggregates scores per image group.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use axum::{extract::State, Json};
use serde::Serialize;
use vrq_common::sink::csv_file::read_rows;
use vrq_common::sink::ResultRow;
use vrq_common::Choice;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Aggregate over one image group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub responses: usize,
    pub mean_score: f64,
    pub min_score: i32,
    pub max_score: i32,
    /// Responses per choice label; every scale label is present
    pub choice_counts: BTreeMap<String, usize>,
}

/// Aggregate over the whole result file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsSummary {
    pub total_rows: usize,
    /// Distinct participant ids
    pub participants: usize,
    /// Every choice label seen in any group: the scale first, then extras by name
    pub choice_labels: Vec<String>,
    /// Sorted by group name
    pub groups: Vec<GroupSummary>,
}

/// Summarize result rows per group
pub fn summarize(rows: &[ResultRow]) -> ResultsSummary {
    let mut by_group: BTreeMap<&str, Vec<&ResultRow>> = BTreeMap::new();
    for row in rows {
        by_group.entry(row.group.as_str()).or_default().push(row);
    }

    let groups: Vec<GroupSummary> = by_group
        .into_iter()
        .map(|(group, rows)| {
            let mut choice_counts: BTreeMap<String, usize> = Choice::ALL
                .iter()
                .map(|choice| (choice.label().to_string(), 0))
                .collect();
            for row in &rows {
                *choice_counts.entry(row.choice.clone()).or_default() += 1;
            }

            let total: i64 = rows.iter().map(|r| i64::from(r.score)).sum();
            GroupSummary {
                group: group.to_string(),
                responses: rows.len(),
                mean_score: total as f64 / rows.len() as f64,
                min_score: rows.iter().map(|r| r.score).min().unwrap_or_default(),
                max_score: rows.iter().map(|r| r.score).max().unwrap_or_default(),
                choice_counts,
            }
        })
        .collect();

    let participants: BTreeSet<&str> = rows.iter().map(|r| r.participant_id.as_str()).collect();

    ResultsSummary {
        total_rows: rows.len(),
        participants: participants.len(),
        choice_labels: choice_labels(&groups),
        groups,
    }
}

/// Union of the choice labels across groups
fn choice_labels(groups: &[GroupSummary]) -> Vec<String> {
    let mut labels: Vec<String> = Choice::ALL
        .iter()
        .map(|choice| choice.label().to_string())
        .collect();
    let extras: BTreeSet<&String> = groups
        .iter()
        .flat_map(|group| group.choice_counts.keys())
        .filter(|label| !labels.contains(*label))
        .collect();
    labels.extend(extras.into_iter().cloned());
    labels
}

/// Read all result rows, or fail when results are not stored locally
pub async fn load_rows(state: &AppState) -> ApiResult<Vec<ResultRow>> {
    let path: PathBuf = state.results_path.clone().ok_or(ApiError::RemoteSink)?;
    tokio::task::spawn_blocking(move || read_rows(&path))
        .await
        .map_err(|e| ApiError::Internal(format!("Result reader task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> ApiResult<Json<ResultsSummary>> {
    let rows = load_rows(&state).await?;
    Ok(Json(summarize(&rows)))
}

/// GET /api/results
pub async fn get_results(State(state): State<AppState>) -> ApiResult<Json<Vec<ResultRow>>> {
    Ok(Json(load_rows(&state).await?))
}
