//! Remote form sink tests
//!
//! Runs a small axum form endpoint on an ephemeral port and points the
//! sink at it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vrq_common::sink::{FieldMapping, RemoteFormSink};
use vrq_common::{
    Answer, AnswerSink, Choice, FlushReport, QuestionItem, QuestionPool, SessionError, Survey,
};

/// How the fake endpoint treats the n-th request (1-based)
#[derive(Clone, Copy)]
enum Behaviour {
    Ok,
    Hang,
    ServerError,
    /// Answers after 200 ms
    Slow,
}

#[derive(Clone)]
struct Endpoint {
    plan: Arc<Vec<Behaviour>>,
    received: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn form_response(
    State(endpoint): State<Endpoint>,
    Form(fields): Form<HashMap<String, String>>,
) -> StatusCode {
    let n = {
        let mut received = endpoint.received.lock().unwrap();
        received.push(fields);
        received.len()
    };
    match endpoint.plan.get(n - 1).copied().unwrap_or(Behaviour::Ok) {
        Behaviour::Ok => StatusCode::OK,
        Behaviour::Hang => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }
        Behaviour::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        Behaviour::Slow => {
            tokio::time::sleep(Duration::from_millis(200)).await;
            StatusCode::OK
        }
    }
}

async fn spawn_endpoint(plan: Vec<Behaviour>) -> (SocketAddr, Endpoint) {
    let endpoint = Endpoint {
        plan: Arc::new(plan),
        received: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/formResponse", post(form_response))
        .with_state(endpoint.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, endpoint)
}

fn mapping() -> FieldMapping {
    FieldMapping {
        group: "entry.100".to_string(),
        left_img: "entry.101".to_string(),
        right_img: "entry.102".to_string(),
        score: "entry.103".to_string(),
        choice: "entry.104".to_string(),
        participant_id: "entry.105".to_string(),
        timestamp: "entry.106".to_string(),
        question_number: Some("entry.107".to_string()),
    }
}

fn rows(n: u32) -> Vec<Answer> {
    (1..=n)
        .map(|i| Answer {
            question_number: i,
            left_image_id: format!("{i}.png"),
            right_image_id: format!("{i}_bbox.png"),
            group: "car".to_string(),
            choice: Choice::MinorArtifacts,
            score: 1,
            participant_id: "p-remote".to_string(),
        })
        .collect()
}

fn sink_for(addr: SocketAddr, timeout: Duration) -> RemoteFormSink {
    RemoteFormSink::new(
        Some(format!("http://{addr}/formResponse")),
        Some(mapping()),
        timeout,
    )
    .unwrap()
}

#[tokio::test]
async fn test_timeout_on_one_row_does_not_skip_the_rest() {
    let (addr, endpoint) =
        spawn_endpoint(vec![Behaviour::Ok, Behaviour::Hang, Behaviour::Ok]).await;
    let sink = sink_for(addr, Duration::from_millis(300));

    let report = sink.flush(&rows(3)).await;
    assert_eq!(report, FlushReport::new(2, 1));

    let received = endpoint.received.lock().unwrap();
    assert_eq!(received.len(), 3, "every row must be attempted");
    let numbers: Vec<&str> = received.iter().map(|f| f["entry.107"].as_str()).collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_non_success_status_counts_as_failure() {
    let (addr, endpoint) =
        spawn_endpoint(vec![Behaviour::ServerError, Behaviour::Ok, Behaviour::Ok]).await;
    let sink = sink_for(addr, Duration::from_secs(5));

    assert_eq!(sink.flush(&rows(3)).await, FlushReport::new(2, 1));
    assert_eq!(endpoint.received.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_fields_are_mapped() {
    let (addr, endpoint) = spawn_endpoint(vec![Behaviour::Ok]).await;
    let sink = sink_for(addr, Duration::from_secs(5));

    assert_eq!(sink.flush(&rows(1)).await, FlushReport::new(1, 0));

    let received = endpoint.received.lock().unwrap();
    let fields = &received[0];
    assert_eq!(fields["entry.100"], "car");
    assert_eq!(fields["entry.101"], "1.png");
    assert_eq!(fields["entry.102"], "1_bbox.png");
    assert_eq!(fields["entry.103"], "1");
    assert_eq!(fields["entry.104"], "Overall Real with Minor Artifacts");
    assert_eq!(fields["entry.105"], "p-remote");
    assert!(fields["entry.106"].ends_with('Z'));
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_each_row() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = sink_for(addr, Duration::from_secs(2));
    assert_eq!(sink.flush(&rows(2)).await, FlushReport::new(0, 2));
}

#[tokio::test]
async fn test_missing_mapping_attempts_nothing() {
    let (addr, endpoint) = spawn_endpoint(vec![]).await;
    let sink = RemoteFormSink::new(
        Some(format!("http://{addr}/formResponse")),
        None,
        Duration::from_secs(5),
    )
    .unwrap();

    assert_eq!(sink.flush(&rows(3)).await, FlushReport::new(0, 3));
    assert!(endpoint.received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_abandoned_submit_still_delivers_every_row() {
    let (addr, endpoint) = spawn_endpoint(vec![Behaviour::Slow; 3]).await;
    let sink = Arc::new(sink_for(addr, Duration::from_secs(5)));

    let items = (1..=3)
        .map(|i| QuestionItem {
            left_image_id: format!("{i}.png"),
            right_image_id: format!("{i}.png"),
            group: "car".to_string(),
            annotated_group: "car".to_string(),
        })
        .collect();
    let survey = Survey::new(Arc::new(QuestionPool::from_items(items)), sink, 3);
    let session = Arc::new(tokio::sync::Mutex::new(survey.start().unwrap()));

    let label = Choice::CompletelyReal.label();
    survey.submit(&session, 1, Some(label)).await.unwrap();
    survey.submit(&session, 2, Some(label)).await.unwrap();

    // Caller gives up partway through the three 200 ms posts
    let last = tokio::time::timeout(
        Duration::from_millis(300),
        survey.submit(&session, 3, Some(label)),
    )
    .await;
    assert!(last.is_err(), "submit should still be flushing");

    // The flush holds the session lock until it has finished
    let done = session.lock().await;
    assert!(done.is_done());
    assert!(done.answers().is_empty());
    assert_eq!(done.flush_report(), Some(FlushReport::new(3, 0)));
    drop(done);

    let received = endpoint.received.lock().unwrap().len();
    assert_eq!(received, 3, "every row must reach the endpoint");

    let again = survey.submit(&session, 3, Some(label)).await.unwrap_err();
    assert_eq!(again, SessionError::Finished { total: 3 });
}
