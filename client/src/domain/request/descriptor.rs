//! Immutable description of one logical HTTP call.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

/// Default per-attempt timeout window.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// HTTP methods used by the remote API and routing providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document; sent with `Content-Type: application/json`.
    Json(Value),
    /// Plain text.
    Text(String),
    /// Binary upload with an explicit content type.
    Bytes {
        /// MIME type sent with the upload.
        content_type: String,
        /// Raw bytes.
        data: Vec<u8>,
    },
    /// URL-encoded form fields; the transport picks the content type.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Content type implied by the body, if any.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Empty | Self::Form(_) => None,
            Self::Json(_) => Some("application/json"),
            Self::Text(_) => Some("text/plain; charset=utf-8"),
            Self::Bytes { content_type, .. } => Some(content_type.as_str()),
        }
    }
}

/// Immutable description of one HTTP call.
///
/// Interceptors receive the descriptor by value and hand back a transformed
/// copy; the engine never mutates one in place.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use itinerary_client::domain::request::{HttpMethod, RequestDescriptor};
///
/// let descriptor = RequestDescriptor::new(HttpMethod::Get, "/trips")
///     .with_timeout(Duration::from_secs(5))
///     .with_request_id("trip-list");
/// assert_eq!(descriptor.request_id(), Some("trip-list"));
/// assert_eq!(descriptor.retries(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: RequestBody,
    timeout: Duration,
    retries: u32,
    request_id: Option<String>,
    skip_retry: bool,
}

impl RequestDescriptor {
    /// Describe a request with default timeout and retry budget.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            request_id: None,
            skip_retry: false,
        }
    }

    /// Replace the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set a header, replacing an existing one with the same name
    /// (case-insensitive).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Set the per-attempt timeout window.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget (attempts after the first).
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Register the call under a cancellation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Disable retries regardless of the retry budget.
    #[must_use]
    pub fn with_skip_retry(mut self, skip_retry: bool) -> Self {
        self.skip_retry = skip_retry;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Absolute or base-relative URL.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Header pairs in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Per-attempt timeout window.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry budget.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Cancellation id, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Whether retries are disabled.
    pub fn skip_retry(&self) -> bool {
        self.skip_retry
    }
}

/// Per-call overrides accepted by the verb helpers on the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Timeout override.
    pub timeout: Option<Duration>,
    /// Retry budget override.
    pub retries: Option<u32>,
    /// Cancellation id.
    pub request_id: Option<String>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Disable retries.
    pub skip_retry: bool,
}

impl RequestOptions {
    /// Options carrying only a cancellation id.
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, descriptor: RequestDescriptor) -> RequestDescriptor {
        let Self {
            timeout,
            retries,
            request_id,
            headers,
            skip_retry,
        } = self;
        let mut descriptor = descriptor.with_skip_retry(skip_retry);
        if let Some(timeout) = timeout {
            descriptor = descriptor.with_timeout(timeout);
        }
        if let Some(retries) = retries {
            descriptor = descriptor.with_retries(retries);
        }
        if let Some(request_id) = request_id {
            descriptor = descriptor.with_request_id(request_id);
        }
        headers
            .into_iter()
            .fold(descriptor, |acc, (name, value)| acc.with_header(name, value))
    }
}
