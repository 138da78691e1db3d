//! Tests for the HTTP error taxonomy.

use std::error::Error as _;
use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use super::*;

#[rstest]
#[case::bad_request(400, HttpErrorKind::Client, false)]
#[case::unauthorized(401, HttpErrorKind::Client, false)]
#[case::not_found(404, HttpErrorKind::Client, false)]
#[case::conflict(409, HttpErrorKind::Client, false)]
#[case::too_many_requests(429, HttpErrorKind::Client, true)]
#[case::internal(500, HttpErrorKind::Server, true)]
#[case::bad_gateway(502, HttpErrorKind::Server, true)]
#[case::unavailable(503, HttpErrorKind::Server, true)]
fn classifies_statuses(
    #[case] status: u16,
    #[case] kind: HttpErrorKind,
    #[case] retryable: bool,
) {
    let error = HttpError::from_status(status, None);
    assert_eq!(error.kind(), kind);
    assert_eq!(error.status(), status);
    assert_eq!(error.is_retryable(), retryable);
}

#[test]
fn transport_kinds_follow_retry_policy() {
    assert!(HttpError::network("connection reset").is_retryable());
    assert!(HttpError::timeout(Duration::from_secs(30)).is_retryable());
    let cancelled = HttpError::cancelled(Some("seg-12"));
    assert!(!cancelled.is_retryable());
    assert!(cancelled.is_cancelled());
    assert_eq!(cancelled.status(), CANCELLED_STATUS);
}

#[rstest]
#[case::message(json!({ "message": "trip not found" }), "trip not found")]
#[case::error(json!({ "error": "quota exceeded" }), "quota exceeded")]
#[case::detail(json!({ "detail": "invalid day" }), "invalid day")]
#[case::message_wins(json!({ "detail": "second", "message": "first" }), "first")]
#[case::blank_message_skipped(json!({ "message": "  ", "error": "fallback" }), "fallback")]
#[case::bare_string(json!("plain failure"), "plain failure")]
#[case::no_known_field(json!({ "code": 7 }), "HTTP 422")]
fn extracts_message_from_error_body(#[case] payload: Value, #[case] expected: &str) {
    let error = HttpError::from_status(422, Some(payload.clone()));
    assert_eq!(error.message(), expected);
    assert_eq!(error.payload(), Some(&payload));
}

#[test]
fn decode_errors_keep_their_cause() {
    let cause = serde_json::from_str::<Value>("{").expect_err("invalid json");
    let error = HttpError::decode(cause);
    assert_eq!(error.kind(), HttpErrorKind::Network);
    assert_eq!(error.status(), NETWORK_STATUS);
    assert!(error.source().is_some(), "cause should be exposed as source");
}

#[test]
fn equality_ignores_cause() {
    let io = std::io::Error::other("reset");
    let with_cause = HttpError::network("connection reset").with_cause(io);
    assert_eq!(with_cause, HttpError::network("connection reset"));
}

#[test]
fn display_includes_kind_and_status() {
    let error = HttpError::from_status(404, Some(json!({ "message": "missing" })));
    assert_eq!(error.to_string(), "client error (404): missing");
}
