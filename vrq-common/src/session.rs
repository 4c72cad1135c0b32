//! Per-participant session state machine
//!
//! A session samples its questions once, then moves a cursor forward one
//! accepted answer at a time:
//!
//! ```text
//! ASKING --submit (last question)--> DONE
//!   ^  |
//!   +--+ submit (accepted / duplicate / rejected)
//! ```
//!
//! Transitions never perform I/O. [`Session::submit_answer`] returns a
//! [`Transition`] whose intents the caller executes: the flush intent is
//! emitted exactly once, on the transition into DONE, and the caller
//! acknowledges it with [`Session::complete_flush`].

use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::pool::{QuestionItem, QuestionPool};
use crate::rating::{Choice, UnknownChoice};
use crate::sink::FlushReport;

/// One accepted rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// 1-based position within the session
    pub question_number: u32,
    pub left_image_id: String,
    pub right_image_id: String,
    pub group: String,
    pub choice: Choice,
    pub score: i8,
    pub participant_id: String,
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Asking,
    Done,
}

/// The question a session is currently asking
#[derive(Debug, Clone, Copy)]
pub struct CurrentQuestion<'a> {
    pub item: &'a QuestionItem,
    /// 1-based display number
    pub number: u32,
    pub total: u32,
}

/// What a submission did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Answer recorded, cursor advanced
    Accepted { question_number: u32 },
    /// Same question submitted again; nothing recorded
    Duplicate { question_number: u32 },
}

/// Page the presentation layer should show next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Question { number: u32 },
    Completion,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Persist these rows to the result sink
    Flush(Vec<Answer>),
    Render(View),
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub outcome: SubmitOutcome,
    pub intents: Vec<Intent>,
}

impl Transition {
    /// Rows to flush, if this transition finished the session
    pub fn flush_rows(&self) -> Option<&[Answer]> {
        self.intents.iter().find_map(|intent| match intent {
            Intent::Flush(rows) => Some(rows.as_slice()),
            Intent::Render(_) => None,
        })
    }

    pub fn view(&self) -> Option<View> {
        self.intents.iter().find_map(|intent| match intent {
            Intent::Render(view) => Some(*view),
            Intent::Flush(_) => None,
        })
    }
}

/// Session errors
///
/// None of these mutate the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Session cannot be created with the given pool/count
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation requires the ASKING state
    #[error("Session finished: all {total} questions answered")]
    Finished { total: u32 },

    /// No choice was selected
    #[error("Please select an answer before continuing.")]
    MissingChoice,

    #[error(transparent)]
    UnknownChoice(#[from] UnknownChoice),

    /// Submission for a question other than the current one
    #[error("Question {submitted} is not the current question ({expected})")]
    OutOfOrder { submitted: u32, expected: u32 },

    /// Submission task stopped before finishing (runtime shutdown)
    #[error("Submission interrupted")]
    Interrupted,
}

/// One participant's questionnaire run
#[derive(Debug, Clone)]
pub struct Session {
    participant_id: String,
    pool: Arc<QuestionPool>,
    question_order: Vec<usize>,
    cursor: usize,
    answers: Vec<Answer>,
    last_saved_question_number: Option<u32>,
    flush_report: Option<FlushReport>,
}

impl Session {
    /// Start a session with `min(configured_count, pool size)` questions
    pub fn initialize(
        pool: Arc<QuestionPool>,
        configured_count: usize,
        participant_id: impl Into<String>,
    ) -> Result<Self, SessionError> {
        Self::initialize_with_rng(pool, configured_count, participant_id, &mut rand::thread_rng())
    }

    /// [`Session::initialize`] with a caller-provided RNG
    pub fn initialize_with_rng<R: Rng + ?Sized>(
        pool: Arc<QuestionPool>,
        configured_count: usize,
        participant_id: impl Into<String>,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        if pool.is_empty() {
            return Err(SessionError::Configuration(
                "question pool is empty, nothing to ask".to_string(),
            ));
        }
        if configured_count == 0 {
            return Err(SessionError::Configuration(
                "questions per participant must be at least 1".to_string(),
            ));
        }

        let amount = configured_count.min(pool.len());
        let question_order = rand::seq::index::sample(rng, pool.len(), amount).into_vec();

        Ok(Self {
            participant_id: participant_id.into(),
            pool,
            question_order,
            cursor: 0,
            answers: Vec::new(),
            last_saved_question_number: None,
            flush_report: None,
        })
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn question_order(&self) -> &[usize] {
        &self.question_order
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.question_order.len()
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn last_saved_question_number(&self) -> Option<u32> {
        self.last_saved_question_number
    }

    /// Report of the completion flush, once acknowledged
    pub fn flush_report(&self) -> Option<FlushReport> {
        self.flush_report
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.question_order.len()
    }

    pub fn state(&self) -> SessionState {
        if self.is_done() {
            SessionState::Done
        } else {
            SessionState::Asking
        }
    }

    pub fn current_question(&self) -> Result<CurrentQuestion<'_>, SessionError> {
        if self.is_done() {
            return Err(self.finished());
        }
        Ok(CurrentQuestion {
            item: self.item_at_cursor(),
            number: self.cursor as u32 + 1,
            total: self.total() as u32,
        })
    }

    /// Record the participant's choice for question `question_number`
    pub fn submit_answer(
        &mut self,
        question_number: u32,
        choice: Option<&str>,
    ) -> Result<Transition, SessionError> {
        if self.is_done() {
            return Err(self.finished());
        }

        let label = choice
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SessionError::MissingChoice)?;
        let choice: Choice = label.parse()?;

        let expected = self.cursor as u32 + 1;

        if self.last_saved_question_number == Some(question_number) {
            debug!(
                participant_id = %self.participant_id,
                question_number,
                "Duplicate submission ignored"
            );
            return Ok(Transition {
                outcome: SubmitOutcome::Duplicate { question_number },
                intents: vec![Intent::Render(View::Question { number: expected })],
            });
        }

        if question_number != expected {
            return Err(SessionError::OutOfOrder {
                submitted: question_number,
                expected,
            });
        }

        let item = self.item_at_cursor();
        let answer = Answer {
            question_number,
            left_image_id: item.left_image_id.clone(),
            right_image_id: item.right_image_id.clone(),
            group: item.group.clone(),
            choice,
            score: choice.score(),
            participant_id: self.participant_id.clone(),
        };

        self.answers.push(answer);
        self.last_saved_question_number = Some(question_number);
        self.cursor += 1;

        let intents = if self.is_done() {
            vec![
                Intent::Flush(self.answers.clone()),
                Intent::Render(View::Completion),
            ]
        } else {
            vec![Intent::Render(View::Question {
                number: self.cursor as u32 + 1,
            })]
        };

        Ok(Transition {
            outcome: SubmitOutcome::Accepted { question_number },
            intents,
        })
    }

    /// Acknowledge the completion flush
    ///
    /// Clears the answer buffer whatever the report says; rows that failed
    /// to persist are not retried.
    pub fn complete_flush(&mut self, report: FlushReport) {
        self.answers.clear();
        self.flush_report = Some(report);
    }

    fn item_at_cursor(&self) -> &QuestionItem {
        // question_order holds indices sampled from 0..pool.len()
        &self.pool.items()[self.question_order[self.cursor]]
    }

    fn finished(&self) -> SessionError {
        SessionError::Finished {
            total: self.total() as u32,
        }
    }
}
