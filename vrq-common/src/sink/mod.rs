//! Result sinks
//!
//! A sink receives the answers of a finished session and persists them
//! somewhere durable. Flushing never fails as a whole: each sink reports
//! how many rows it persisted and how many it lost.

pub mod csv_file;
pub mod remote_form;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::SinkConfig;
use crate::session::Answer;
use crate::time::format_row_timestamp;
use crate::Result;

pub use csv_file::CsvFileSink;
pub use remote_form::{FieldMapping, RemoteFormSink};

/// Result file columns, in order
pub const RESULT_COLUMNS: [&str; 8] = [
    "question_number",
    "left_img",
    "right_img",
    "group",
    "choice",
    "score",
    "participant_id",
    "timestamp",
];

/// Outcome of one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub success_count: usize,
    pub failure_count: usize,
}

impl FlushReport {
    pub fn new(success_count: usize, failure_count: usize) -> Self {
        Self {
            success_count,
            failure_count,
        }
    }

    /// Every row lost
    pub fn all_failed(rows: usize) -> Self {
        Self::new(0, rows)
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn is_complete(&self) -> bool {
        self.failure_count == 0
    }
}

/// Per-row delivery failure
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Endpoint returned HTTP {0}")]
    Status(u16),
}

/// Persisted form of an [`Answer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub question_number: u32,
    pub left_img: String,
    pub right_img: String,
    pub group: String,
    pub choice: String,
    pub score: i32,
    pub participant_id: String,
    pub timestamp: String,
}

impl ResultRow {
    /// Stamp an answer with the flush time
    pub fn from_answer(answer: &Answer, flushed_at: DateTime<Utc>) -> Self {
        Self {
            question_number: answer.question_number,
            left_img: answer.left_image_id.clone(),
            right_img: answer.right_image_id.clone(),
            group: answer.group.clone(),
            choice: answer.choice.label().to_string(),
            score: i32::from(answer.score),
            participant_id: answer.participant_id.clone(),
            timestamp: format_row_timestamp(flushed_at),
        }
    }

    /// Value of a result column by name
    pub fn field(&self, column: &str) -> Option<String> {
        let value = match column {
            "question_number" => self.question_number.to_string(),
            "left_img" => self.left_img.clone(),
            "right_img" => self.right_img.clone(),
            "group" => self.group.clone(),
            "choice" => self.choice.clone(),
            "score" => self.score.to_string(),
            "participant_id" => self.participant_id.clone(),
            "timestamp" => self.timestamp.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// Destination for finished sessions' answers
#[async_trait::async_trait]
pub trait AnswerSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &'static str;

    /// Persist `rows`, reporting per-row success
    async fn flush(&self, rows: &[Answer]) -> FlushReport;
}

/// Sink selected by configuration
#[derive(Debug)]
pub enum ResultSink {
    Csv(CsvFileSink),
    RemoteForm(RemoteFormSink),
}

impl ResultSink {
    pub fn from_config(config: &SinkConfig) -> Result<Self> {
        match config {
            SinkConfig::Csv { path } => Ok(Self::Csv(CsvFileSink::new(path))),
            SinkConfig::RemoteForm {
                endpoint,
                fields,
                timeout_secs,
            } => Ok(Self::RemoteForm(RemoteFormSink::new(
                endpoint.clone(),
                fields.clone(),
                Duration::from_secs(*timeout_secs),
            )?)),
        }
    }

    /// Local result file, when results can be read back
    pub fn results_path(&self) -> Option<&Path> {
        match self {
            Self::Csv(sink) => Some(sink.path()),
            Self::RemoteForm(_) => None,
        }
    }
}

#[async_trait::async_trait]
impl AnswerSink for ResultSink {
    fn name(&self) -> &'static str {
        match self {
            Self::Csv(sink) => sink.name(),
            Self::RemoteForm(sink) => sink.name(),
        }
    }

    async fn flush(&self, rows: &[Answer]) -> FlushReport {
        match self {
            Self::Csv(sink) => sink.flush(rows).await,
            Self::RemoteForm(sink) => sink.flush(rows).await,
        }
    }
}
