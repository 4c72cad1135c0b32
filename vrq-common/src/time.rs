//! Timestamp utilities

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way result rows store it
pub fn format_row_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Build a participant identifier from the local start time
///
/// Format: `YYYYmmdd_HHMMSS_micros`, e.g. `20261018_142501_123456`.
pub fn participant_id_at(ts: DateTime<Local>) -> String {
    ts.format("%Y%m%d_%H%M%S_%6f").to_string()
}

/// Participant identifier for a session starting now
pub fn new_participant_id() -> String {
    participant_id_at(Local::now())
}
