//! Remote form sink
//!
//! Posts each row as its own `application/x-www-form-urlencoded` request
//! to a form endpoint (e.g. a Google Forms `formResponse` URL). Rows are
//! sent one after another; a failed row never stops the rest.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{AnswerSink, FlushReport, ResultRow, SinkError};
use crate::session::Answer;
use crate::{time, Error, Result};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("vrq/", env!("CARGO_PKG_VERSION"));

/// External field name for each row column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub group: String,
    pub left_img: String,
    pub right_img: String,
    pub score: String,
    pub choice: String,
    pub participant_id: String,
    pub timestamp: String,
    /// Not sent unless mapped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_number: Option<String>,
}

impl FieldMapping {
    /// Form body for one row
    pub fn form_fields(&self, row: &ResultRow) -> Vec<(String, String)> {
        let mut fields = vec![
            (self.group.clone(), row.group.clone()),
            (self.left_img.clone(), row.left_img.clone()),
            (self.right_img.clone(), row.right_img.clone()),
            (self.score.clone(), row.score.to_string()),
            (self.choice.clone(), row.choice.clone()),
            (self.participant_id.clone(), row.participant_id.clone()),
            (self.timestamp.clone(), row.timestamp.clone()),
        ];
        if let Some(name) = &self.question_number {
            fields.push((name.clone(), row.question_number.to_string()));
        }
        fields
    }
}

#[derive(Debug)]
pub struct RemoteFormSink {
    http_client: reqwest::Client,
    endpoint: Option<String>,
    fields: Option<FieldMapping>,
}

impl RemoteFormSink {
    /// Missing `endpoint` or `fields` is accepted here and reported on flush
    pub fn new(
        endpoint: Option<String>,
        fields: Option<FieldMapping>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            fields,
        })
    }

    async fn submit_row(
        &self,
        endpoint: &str,
        fields: &FieldMapping,
        row: &ResultRow,
    ) -> std::result::Result<(), SinkError> {
        let response = self
            .http_client
            .post(endpoint)
            .form(&fields.form_fields(row))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SinkError::Timeout
                } else {
                    SinkError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Status(status.as_u16()))
        }
    }
}

#[async_trait::async_trait]
impl AnswerSink for RemoteFormSink {
    fn name(&self) -> &'static str {
        "remote_form"
    }

    async fn flush(&self, rows: &[Answer]) -> FlushReport {
        let (endpoint, fields) = match (&self.endpoint, &self.fields) {
            (Some(endpoint), Some(fields)) => (endpoint, fields),
            (endpoint, fields) => {
                error!(
                    "Remote form sink not configured (endpoint: {}, field mapping: {}); {} rows not sent",
                    if endpoint.is_some() { "set" } else { "missing" },
                    if fields.is_some() { "set" } else { "missing" },
                    rows.len()
                );
                return FlushReport::all_failed(rows.len());
            }
        };

        let flushed_at = time::now();
        let mut report = FlushReport::default();

        for answer in rows {
            let row = ResultRow::from_answer(answer, flushed_at);
            match self.submit_row(endpoint, fields, &row).await {
                Ok(()) => {
                    debug!(question_number = row.question_number, "Row submitted");
                    report.success_count += 1;
                }
                Err(e) => {
                    warn!(
                        question_number = row.question_number,
                        participant_id = %row.participant_id,
                        "Row submission failed: {}",
                        e
                    );
                    report.failure_count += 1;
                }
            }
        }

        info!(
            "Remote form flush: {} succeeded, {} failed",
            report.success_count, report.failure_count
        );
        report
    }
}
