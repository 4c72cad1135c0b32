//! CSV result file sink
//!
//! The file is rewritten on every flush: existing rows are read back,
//! new rows appended, and the result written to a sibling temp file that
//! replaces the original. Writers in this process take `write_lock`
//! first; separate processes sharing one file can still race.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{AnswerSink, FlushReport, ResultRow, RESULT_COLUMNS};
use crate::session::Answer;
use crate::{time, Error, Result};

#[derive(Debug)]
pub struct CsvFileSink {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append rows to the file, creating it with a header if needed
    ///
    /// The lock guard moves into the blocking write, so the lock is held
    /// until the file is replaced even if this future is dropped.
    pub async fn append(&self, rows: Vec<ResultRow>) -> Result<()> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            append_rows(&path, &rows)
        })
        .await
        .map_err(|e| Error::Internal(format!("CSV writer task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl AnswerSink for CsvFileSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn flush(&self, rows: &[Answer]) -> FlushReport {
        if rows.is_empty() {
            return FlushReport::default();
        }

        let flushed_at = time::now();
        let result_rows: Vec<ResultRow> = rows
            .iter()
            .map(|a| ResultRow::from_answer(a, flushed_at))
            .collect();

        match self.append(result_rows).await {
            Ok(()) => {
                info!("Saved {} rows to {}", rows.len(), self.path.display());
                FlushReport::new(rows.len(), 0)
            }
            Err(e) => {
                error!("Failed to save {} rows to {}: {}", rows.len(), self.path.display(), e);
                FlushReport::all_failed(rows.len())
            }
        }
    }
}

/// Read every row from a result file
///
/// A missing file has no rows. Columns other than the result columns
/// are ignored.
pub fn read_rows(path: &Path) -> Result<Vec<ResultRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<ResultRow>, csv::Error>>()?;
    Ok(rows)
}

fn append_rows(path: &Path, rows: &[ResultRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let (mut header, existing) = if path.exists() {
        read_raw(path)?
    } else {
        (Vec::new(), Vec::new())
    };

    // Union of the existing header and ours; existing column order wins
    for column in RESULT_COLUMNS {
        if !header.iter().any(|h| h == column) {
            header.push(column.to_string());
        }
    }

    let tmp_path = temp_path_for(path);
    {
        let mut writer = csv::Writer::from_path(&tmp_path)?;
        writer.write_record(&header)?;

        for record in &existing {
            let mut fields: Vec<&str> = record.iter().collect();
            fields.resize(header.len(), "");
            writer.write_record(&fields)?;
        }

        for row in rows {
            let fields: Vec<String> = header
                .iter()
                .map(|column| row.field(column).unwrap_or_default())
                .collect();
            writer.write_record(&fields)?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn read_raw(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok((header, records))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results.csv".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
