//! Survey driver
//!
//! Connects sessions to the question pool and the result sink: starts
//! sessions and executes the intents their transitions emit.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::pool::QuestionPool;
use crate::session::{Session, SessionError, Transition};
use crate::sink::{AnswerSink, ResultSink};
use crate::time;

pub struct Survey<S: ?Sized = ResultSink> {
    pool: Arc<QuestionPool>,
    sink: Arc<S>,
    questions_per_participant: usize,
}

impl<S: ?Sized> Clone for Survey<S> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            sink: Arc::clone(&self.sink),
            questions_per_participant: self.questions_per_participant,
        }
    }
}

impl<S: AnswerSink + ?Sized> Survey<S> {
    pub fn new(pool: Arc<QuestionPool>, sink: Arc<S>, questions_per_participant: usize) -> Self {
        Self {
            pool,
            sink,
            questions_per_participant,
        }
    }

    pub fn pool(&self) -> &Arc<QuestionPool> {
        &self.pool
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Start a session for a new participant
    pub fn start(&self) -> Result<Session, SessionError> {
        let session = Session::initialize(
            Arc::clone(&self.pool),
            self.questions_per_participant,
            time::new_participant_id(),
        )?;
        info!(
            participant_id = session.participant_id(),
            questions = session.total(),
            "Session started"
        );
        Ok(session)
    }

    /// Submit an answer to a shared session and run the resulting flush
    ///
    /// The command runs in its own task holding the session lock, so a
    /// caller that stops waiting (a dropped request) cannot cut the flush
    /// short: the flush and `complete_flush` still happen, and concurrent
    /// submissions for the same session wait for them.
    pub async fn submit(
        &self,
        session: &Arc<Mutex<Session>>,
        question_number: u32,
        choice: Option<&str>,
    ) -> Result<Transition, SessionError>
    where
        S: 'static,
    {
        let survey = self.clone();
        let session = Arc::clone(session);
        let choice = choice.map(str::to_owned);

        let task = tokio::spawn(async move {
            let mut session = session.lock().await;
            survey
                .run_command(&mut session, question_number, choice.as_deref())
                .await
        });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!("Submission task cancelled: {}", e);
                Err(SessionError::Interrupted)
            }
        }
    }

    /// Only the transition into DONE carries a flush intent, so the flush
    /// runs at most once per session.
    async fn run_command(
        &self,
        session: &mut Session,
        question_number: u32,
        choice: Option<&str>,
    ) -> Result<Transition, SessionError> {
        let transition = session.submit_answer(question_number, choice)?;

        if let Some(rows) = transition.flush_rows() {
            let report = self.sink.flush(rows).await;
            if report.is_complete() {
                info!(
                    participant_id = session.participant_id(),
                    "Session complete: {} answers saved via {}",
                    report.success_count,
                    self.sink.name()
                );
            } else {
                warn!(
                    participant_id = session.participant_id(),
                    "Session complete: {} answers saved, {} lost via {}",
                    report.success_count,
                    report.failure_count,
                    self.sink.name()
                );
            }
            session.complete_flush(report);
        }

        Ok(transition)
    }
}
