//! HTTP transport adapters.
//!
//! Implements the `HttpTransport` port over reqwest.

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;
