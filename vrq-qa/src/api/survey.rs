//! Participant survey handlers
//!
//! Thin adapter over [`vrq_common::Survey`]: each handler locks one
//! session, runs a command against it, and turns the result into a page
//! or a redirect (POST/redirect/GET, so a reload never resubmits).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;
use vrq_common::session::View;
use vrq_common::SessionError;

use crate::api::pages;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Answer form posted from the question page
#[derive(Debug, Deserialize)]
pub struct AnswerForm {
    /// Number of the question the participant was shown
    pub question_number: u32,
    /// Selected label; absent when no radio button was checked
    #[serde(default)]
    pub choice: Option<String>,
}

/// GET /
pub async fn landing(State(state): State<AppState>) -> Html<String> {
    Html(pages::landing_page(state.survey.pool().len()))
}

/// POST /start
///
/// Creates a session and redirects to its first question.
pub async fn start(State(state): State<AppState>) -> ApiResult<Response> {
    let session = match state.survey.start() {
        Ok(session) => session,
        Err(SessionError::Configuration(reason)) => {
            info!("Refusing to start session: {}", reason);
            let page = pages::message_page(
                "Nothing to ask",
                "There are no questions to ask right now. Please check back later.",
            );
            return Ok((StatusCode::SERVICE_UNAVAILABLE, Html(page)).into_response());
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let token = state.sessions.insert(session).await;
    Ok(Redirect::to(&survey_url(token)).into_response())
}

/// GET /survey/:token
///
/// Current question, or the thank-you page once the session is done.
pub async fn survey_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Html<String>> {
    let token = parse_token(&token)?;
    let entry = state
        .sessions
        .get(token)
        .await
        .ok_or(ApiError::SessionNotFound)?;
    let session = entry.lock().await;

    match session.current_question() {
        Ok(question) => Ok(Html(pages::question_page(token, &question, None))),
        Err(SessionError::Finished { .. }) => {
            Ok(Html(pages::completion_page(session.flush_report())))
        }
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

/// POST /survey/:token/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<AnswerForm>,
) -> ApiResult<Response> {
    let token = parse_token(&token)?;
    let entry = state
        .sessions
        .get(token)
        .await
        .ok_or(ApiError::SessionNotFound)?;

    // Runs under the session lock; a second click waits and is then absorbed
    let result = state
        .survey
        .submit(&entry, form.question_number, form.choice.as_deref())
        .await;

    match result {
        Ok(transition) => {
            match transition.view() {
                Some(View::Completion) => debug!(%token, "Session finished"),
                Some(View::Question { number }) => debug!(%token, number, "Next question"),
                None => {}
            }
            Ok(Redirect::to(&survey_url(token)).into_response())
        }
        Err(e @ (SessionError::MissingChoice | SessionError::UnknownChoice(_))) => {
            let warning = e.to_string();
            let session = entry.lock().await;
            match session.current_question() {
                Ok(question) => {
                    let page = pages::question_page(token, &question, Some(&warning));
                    Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
                }
                Err(_) => Ok(Redirect::to(&survey_url(token)).into_response()),
            }
        }
        Err(e @ (SessionError::OutOfOrder { .. } | SessionError::Finished { .. })) => {
            debug!(%token, "Stale submission: {}", e);
            Ok(Redirect::to(&survey_url(token)).into_response())
        }
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

fn parse_token(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::SessionNotFound)
}

fn survey_url(token: Uuid) -> String {
    format!("/survey/{}", token)
}

/// Build survey routes
pub fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/start", post(start))
        .route("/survey/:token", get(survey_page))
        .route("/survey/:token/answer", post(submit_answer))
}
