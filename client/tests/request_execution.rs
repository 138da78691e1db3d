//! Behavioural tests for the request execution engine through the public API.

use std::sync::Arc;
use std::time::Duration;

use itinerary_client::ClientSettings;
use itinerary_client::domain::request::{RequestExecutor, RequestOptions};
use itinerary_client::domain::{CANCELLED_STATUS, HttpErrorKind};
use itinerary_client::test_support::{ScriptedReply, ScriptedTransport, immediate_runtime};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::sync::mpsc;

const BASE: &str = "https://trips.example.test/api/v1";

#[fixture]
fn settings() -> ClientSettings {
    ClientSettings {
        api_base_url: Some(BASE.to_owned()),
        request_timeout_ms: 1_000,
        retries: 1,
        backoff_base_ms: 1,
        max_jitter_ms: 0,
        maps_vector_base_url: None,
        maps_vector_token: None,
        open_routing_base_url: None,
        open_routing_api_key: None,
        routing_preference: None,
    }
}

#[rstest]
#[tokio::test]
async fn configured_retry_budget_bounds_attempts(settings: ClientSettings) {
    let transport = Arc::new(ScriptedTransport::repeating(ScriptedReply::json(
        502,
        &json!({ "error": "bad gateway" }),
    )));
    let executor = settings
        .request_executor(transport.clone())
        .expect("executor");

    let error = executor
        .get("/trips", RequestOptions::default())
        .await
        .expect_err("server keeps failing");

    assert_eq!(error.kind(), HttpErrorKind::Server);
    assert_eq!(error.status(), 502);
    assert_eq!(error.message(), "bad gateway");
    assert_eq!(transport.calls(), 2);
    assert_eq!(transport.requests()[0].url, format!("{BASE}/trips"));
}

#[rstest]
#[tokio::test]
async fn transient_failures_are_invisible_to_callers(settings: ClientSettings) {
    let transport = Arc::new(ScriptedTransport::new(vec![
        ScriptedReply::status(503),
        ScriptedReply::json(200, &json!({ "trips": [] })),
    ]));
    let executor = settings
        .request_executor(transport.clone())
        .expect("executor");

    let body = executor
        .get("/trips", RequestOptions::default())
        .await
        .expect("second attempt succeeds");

    assert_eq!(body.as_json(), Some(&json!({ "trips": [] })));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn cancelling_twice_reports_nothing_left_to_cancel() {
    let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
    let transport =
        Arc::new(ScriptedTransport::repeating(ScriptedReply::Hang).with_entry_signal(entered_tx));
    let executor = Arc::new(RequestExecutor::new(transport, BASE).with_runtime(immediate_runtime()));

    let pending = tokio::spawn({
        let executor = Arc::clone(&executor);
        async move {
            executor
                .get("/segments/12", RequestOptions::with_request_id("seg-12"))
                .await
        }
    });
    entered_rx.recv().await.expect("request started");

    assert!(executor.cancel("seg-12"));
    assert!(!executor.cancel("seg-12"));

    let error = pending
        .await
        .expect("task joins")
        .expect_err("request was cancelled");
    assert!(error.is_cancelled());
    assert_eq!(error.status(), CANCELLED_STATUS);
    assert!(executor.registry().is_empty());
}

#[tokio::test]
async fn timed_out_attempts_are_retried_then_reported() {
    let transport = Arc::new(ScriptedTransport::repeating(ScriptedReply::Hang));
    let executor = RequestExecutor::new(transport.clone(), BASE).with_runtime(immediate_runtime());
    let options = RequestOptions {
        timeout: Some(Duration::from_millis(20)),
        retries: Some(1),
        ..RequestOptions::default()
    };

    let error = executor
        .get("/trips", options)
        .await
        .expect_err("every attempt times out");

    assert_eq!(error.kind(), HttpErrorKind::Timeout);
    assert_eq!(transport.calls(), 2);
}
