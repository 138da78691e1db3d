//! Structured failure taxonomy shared by every network-facing component.
//!
//! Callers branch once on [`HttpErrorKind`] rather than inspecting raw status
//! codes. Transport causes stay attached for diagnostics but are ignored by
//! equality so tests can compare errors by their observable shape.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status reported for transport-level failures that never produced a response.
pub const NETWORK_STATUS: u16 = 0;
/// Status reported when an attempt exceeded its timeout window.
pub const TIMEOUT_STATUS: u16 = 408;
/// Status reported when the caller (or a superseding request) cancelled the call.
pub const CANCELLED_STATUS: u16 = 499;

const TOO_MANY_REQUESTS: u16 = 429;
const ERROR_MESSAGE_FIELDS: [&str; 3] = ["message", "error", "detail"];

/// Failure category of an [`HttpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpErrorKind {
    /// Transport failed before a response arrived.
    Network,
    /// The attempt exceeded its timeout window.
    Timeout,
    /// The request was cancelled explicitly or superseded.
    Cancelled,
    /// The server answered with a 4xx status.
    Client,
    /// The server answered with a 5xx status.
    Server,
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Client => "client",
            Self::Server => "server",
        };
        f.write_str(label)
    }
}

/// Shared, thread-safe wrapped cause.
pub type ErrorCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned by every request issued through the execution engine.
///
/// ## Invariants
/// - `is_retryable` holds iff the kind is network or timeout, the status is
///   at least 500, or the status is 429.
/// - Client errors other than 429 and cancellations are never retried.
///
/// # Examples
/// ```
/// use itinerary_client::domain::{HttpError, HttpErrorKind};
///
/// let err = HttpError::from_status(503, None);
/// assert_eq!(err.kind(), HttpErrorKind::Server);
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone)]
pub struct HttpError {
    kind: HttpErrorKind,
    status: u16,
    message: String,
    payload: Option<Value>,
    cause: Option<ErrorCause>,
}

impl HttpError {
    fn new(kind: HttpErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            payload: None,
            cause: None,
        }
    }

    /// Transport failure without a response.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Network, NETWORK_STATUS, message)
    }

    /// Attempt exceeded its timeout window.
    pub fn timeout(window: Duration) -> Self {
        Self::new(
            HttpErrorKind::Timeout,
            TIMEOUT_STATUS,
            format!("request timed out after {}ms", window.as_millis()),
        )
    }

    /// Request was cancelled before it settled.
    pub fn cancelled(request_id: Option<&str>) -> Self {
        let message = match request_id {
            Some(id) => format!("request `{id}` was cancelled"),
            None => "request was cancelled".to_owned(),
        };
        Self::new(HttpErrorKind::Cancelled, CANCELLED_STATUS, message)
    }

    /// Successful response whose body could not be decoded.
    pub fn decode(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::network(format!("response body could not be decoded: {cause}")).with_cause(cause)
    }

    /// Classify a non-2xx status, extracting a message from the error body.
    ///
    /// Bodies are expected as `{ message?, error?, detail? }`; the first
    /// non-empty string field wins. A bare JSON string is used verbatim.
    pub fn from_status(status: u16, payload: Option<Value>) -> Self {
        let kind = if status >= 500 {
            HttpErrorKind::Server
        } else {
            HttpErrorKind::Client
        };
        let message = payload
            .as_ref()
            .and_then(message_from_payload)
            .unwrap_or_else(|| format!("HTTP {status}"));
        Self {
            payload,
            ..Self::new(kind, status, message)
        }
    }

    /// Attach a wrapped cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach a structured payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Failure category.
    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    /// HTTP-status-like code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Parsed error body, when one was available.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Wrapped transport cause.
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// Whether retrying the request is expected to help.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            HttpErrorKind::Network | HttpErrorKind::Timeout => true,
            HttpErrorKind::Cancelled => false,
            HttpErrorKind::Client | HttpErrorKind::Server => {
                self.status >= 500 || self.status == TOO_MANY_REQUESTS
            }
        }
    }

    /// Whether the request was cancelled; callers that superseded a request
    /// usually swallow these.
    pub fn is_cancelled(&self) -> bool {
        self.kind == HttpErrorKind::Cancelled
    }
}

fn message_from_payload(payload: &Value) -> Option<String> {
    match payload {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(fields) => ERROR_MESSAGE_FIELDS.iter().find_map(|field| {
            fields
                .get(*field)
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
                .map(str::to_owned)
        }),
        _ => None,
    }
}

impl PartialEq for HttpError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.status == other.status
            && self.message == other.message
            && self.payload == other.payload
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error ({}): {}", self.kind, self.status, self.message)
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests;
