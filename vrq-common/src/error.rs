//! Common error types for VRQ

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for VRQ operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across VRQ services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Result file read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image directory missing or unreadable
    #[error("Question pool source error at {path}: {reason}")]
    PoolSource { path: PathBuf, reason: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
