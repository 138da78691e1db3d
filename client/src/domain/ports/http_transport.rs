//! Driven port for sending one HTTP exchange over the wire.
//!
//! The execution engine owns retries, timeouts, and cancellation; transports
//! only move bytes and report what happened.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::request::HttpMethod;

/// Fully resolved request handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Header pairs in insertion order.
    pub headers: Vec<(String, String)>,
    /// Encoded body.
    pub body: TransportBody,
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TransportBody {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes; the content type travels in the headers.
    Bytes(Vec<u8>),
    /// URL-encoded form fields.
    Form(Vec<(String, String)>),
}

/// Raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header, if present.
    pub content_type: Option<String>,
    /// Raw response bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Failures raised before a complete response was received.
    pub enum TransportError {
        /// Connection could not be established or was reset.
        Connect { message: String } => "transport connect failed: {message}",
        /// Transport-level timeout fired.
        Timeout { message: String } => "transport timed out: {message}",
        /// Response body could not be read.
        Body { message: String } => "transport body read failed: {message}",
        /// Request could not be built (bad URL, bad header).
        InvalidRequest { message: String } => "transport rejected request: {message}",
    }
}

/// Port for sending HTTP requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and return the raw response, whatever its status.
    ///
    /// Dropping the returned future aborts the exchange.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
