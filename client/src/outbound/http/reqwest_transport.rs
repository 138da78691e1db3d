//! Reqwest-backed implementation of the `HttpTransport` port.
//!
//! This adapter owns wire details only: method and header mapping, body
//! encoding and transport error classification. Status handling, timeouts
//! and retries stay in the execution engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};

use crate::domain::ports::{
    HttpTransport, TransportBody, TransportError, TransportRequest, TransportResponse,
};
use crate::domain::request::HttpMethod;

const DEFAULT_USER_AGENT: &str = concat!("itinerary-client/", env!("CARGO_PKG_VERSION"));
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport that sends requests through a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with a connect timeout and the crate user agent.
    /// ```rust,ignore
    /// let transport = ReqwestTransport::new()?;
    /// let executor = RequestExecutor::new(Arc::new(transport), base_url);
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let url = Url::parse(&url).map_err(|error| {
            TransportError::invalid_request(format!("invalid url `{url}`: {error}"))
        })?;

        let mut builder = self.client.request(reqwest_method(method), url);
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                TransportError::invalid_request(format!("invalid header name `{name}`: {error}"))
            })?;
            let value = HeaderValue::from_str(&value).map_err(|error| {
                TransportError::invalid_request(format!("invalid value for `{name}`: {error}"))
            })?;
            builder = builder.header(name, value);
        }
        builder = match body {
            TransportBody::Empty => builder,
            TransportBody::Bytes(bytes) => builder.body(bytes),
            TransportBody::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(map_body_error)?;

        Ok(TransportResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_builder() {
        TransportError::invalid_request(error.to_string())
    } else if error.is_body() || error.is_decode() {
        TransportError::body(error.to_string())
    } else {
        TransportError::connect(error.to_string())
    }
}

fn map_body_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else {
        TransportError::body(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Non-network coverage for request construction failures.

    use super::*;

    fn request(url: &str, headers: Vec<(&str, &str)>) -> TransportRequest {
        TransportRequest {
            method: HttpMethod::Get,
            url: url.to_owned(),
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
            body: TransportBody::Empty,
        }
    }

    #[tokio::test]
    async fn relative_urls_are_rejected_before_sending() {
        let transport = ReqwestTransport::new().expect("client builds");
        let error = transport
            .send(request("/trips", Vec::new()))
            .await
            .expect_err("relative url");
        assert!(matches!(error, TransportError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn malformed_headers_are_rejected_before_sending() {
        let transport = ReqwestTransport::new().expect("client builds");
        let error = transport
            .send(request("http://127.0.0.1:9/", vec![("bad header", "x")]))
            .await
            .expect_err("bad header");
        assert!(
            matches!(error, TransportError::InvalidRequest { ref message } if message.contains("bad header"))
        );
    }

    #[test]
    fn methods_map_one_to_one() {
        assert_eq!(reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(reqwest_method(HttpMethod::Delete), Method::DELETE);
    }
}
