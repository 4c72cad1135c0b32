//! # VRQ Common Library
//!
//! Shared code for the vehicle realism questionnaire services:
//! - Rating scale and answer types
//! - Question pool building and directory scanning
//! - Per-participant session state machine
//! - Survey driver that executes session intents
//! - Result sinks (CSV file, remote form endpoint)
//! - Configuration loading and tracing setup
//! - Utility functions

pub mod config;
pub mod error;
pub mod logging;
pub mod pool;
pub mod rating;
pub mod session;
pub mod sink;
pub mod survey;
pub mod time;

pub use error::{Error, Result};
pub use pool::{QuestionItem, QuestionPool};
pub use rating::Choice;
pub use session::{Answer, Session, SessionError};
pub use sink::{AnswerSink, FlushReport, ResultSink};
pub use survey::Survey;
