//! Request execution engine.
//!
//! Every network interaction goes through [`RequestExecutor::execute`]: the
//! engine applies request interceptors, races each attempt against its
//! timeout window and the caller's cancellation token, classifies failures
//! into [`HttpError`], lets response interceptors recover, and retries
//! retryable failures with jittered exponential backoff. Only the final
//! outcome reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::HttpError;
use crate::domain::ports::{
    HttpTransport, TransportBody, TransportError, TransportRequest, TransportResponse,
};

mod body;
mod descriptor;
mod interceptors;
mod registry;
mod retry;

pub use body::ParsedBody;
pub use descriptor::{
    DEFAULT_RETRIES, DEFAULT_TIMEOUT, HttpMethod, RequestBody, RequestDescriptor, RequestOptions,
};
use interceptors::InterceptorChain;
pub use interceptors::{
    ErrorDisposition, InterceptorHandle, RequestInterceptor, ResponseInterceptor,
};
pub use registry::{CancellationRegistry, RegistrationGuard};
use retry::RetryState;
pub use retry::{
    BackoffJitter, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_JITTER, RandomJitter, RetryPolicy,
    RetryRuntime, RetrySleeper, TokioSleeper,
};

/// Timeout and retry budget applied to descriptors built by the verb helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorDefaults {
    /// Per-attempt timeout window.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub retries: u32,
}

impl Default for ExecutorDefaults {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

enum AttemptFailure {
    Failed(HttpError),
    Recovered(ParsedBody),
    /// The server answered 2xx but the body could not be decoded. The
    /// request was delivered, so it is never re-sent.
    Undecodable(HttpError),
}

/// Retrying, cancellable HTTP execution engine.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    defaults: ExecutorDefaults,
    policy: RetryPolicy,
    runtime: RetryRuntime,
    registry: Arc<CancellationRegistry>,
    interceptors: Arc<InterceptorChain>,
}

impl RequestExecutor {
    /// Build an executor resolving relative URLs against `base_url`.
    /// ```rust,ignore
    /// let executor = RequestExecutor::new(Arc::new(transport), "https://api.example/v1");
    /// let trips = executor.get("/trips", RequestOptions::default()).await?;
    /// ```
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            defaults: ExecutorDefaults::default(),
            policy: RetryPolicy::default(),
            runtime: RetryRuntime::default(),
            registry: Arc::new(CancellationRegistry::new()),
            interceptors: Arc::new(InterceptorChain::default()),
        }
    }

    /// Override the verb-helper defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ExecutorDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Override the backoff policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Inject sleeping and jitter implementations.
    #[must_use]
    pub fn with_runtime(mut self, runtime: RetryRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Share a cancellation registry with other executors.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<CancellationRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Cancellation registry used by this executor.
    pub fn registry(&self) -> &Arc<CancellationRegistry> {
        &self.registry
    }

    /// Descriptor pre-filled with this executor's defaults.
    pub fn descriptor(&self, method: HttpMethod, url: impl Into<String>) -> RequestDescriptor {
        RequestDescriptor::new(method, url)
            .with_timeout(self.defaults.timeout)
            .with_retries(self.defaults.retries)
    }

    /// Register a request interceptor; interceptors run in registration order.
    pub fn add_request_interceptor(
        &self,
        interceptor: impl RequestInterceptor + 'static,
    ) -> InterceptorHandle {
        self.interceptors.add_request(Arc::new(interceptor))
    }

    /// Register a response interceptor; interceptors run in registration order.
    pub fn add_response_interceptor(
        &self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> InterceptorHandle {
        self.interceptors.add_response(Arc::new(interceptor))
    }

    /// Cancel the in-flight request registered under `request_id`.
    ///
    /// Returns `false` when nothing is registered under that id.
    pub fn cancel(&self, request_id: &str) -> bool {
        let cancelled = self.registry.cancel(request_id);
        debug!(request_id, cancelled, "cancel requested");
        cancelled
    }

    /// Cancel every registered request; returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.registry.cancel_all();
        debug!(cancelled, "cancel all requested");
        cancelled
    }

    /// `GET url`.
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<ParsedBody, HttpError> {
        self.send_verb(HttpMethod::Get, url, RequestBody::Empty, options)
            .await
    }

    /// `POST url` with `body`.
    pub async fn post(
        &self,
        url: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ParsedBody, HttpError> {
        self.send_verb(HttpMethod::Post, url, body, options).await
    }

    /// `PUT url` with `body`.
    pub async fn put(
        &self,
        url: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ParsedBody, HttpError> {
        self.send_verb(HttpMethod::Put, url, body, options).await
    }

    /// `PATCH url` with `body`.
    pub async fn patch(
        &self,
        url: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ParsedBody, HttpError> {
        self.send_verb(HttpMethod::Patch, url, body, options).await
    }

    /// `DELETE url`.
    pub async fn delete(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ParsedBody, HttpError> {
        self.send_verb(HttpMethod::Delete, url, RequestBody::Empty, options)
            .await
    }

    async fn send_verb(
        &self,
        method: HttpMethod,
        url: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ParsedBody, HttpError> {
        let descriptor = options.apply(self.descriptor(method, url).with_body(body));
        self.execute(descriptor).await
    }

    /// Execute one logical request, retrying retryable failures.
    ///
    /// When the descriptor carries a request id, the call is registered in the
    /// cancellation registry for its whole lifetime (attempts and backoff
    /// sleeps) and replaces any call already registered under that id.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ParsedBody, HttpError> {
        let descriptor = self.interceptors.apply_request(descriptor);
        let registration = descriptor
            .request_id()
            .map(|request_id| self.registry.register(request_id));
        let token = registration
            .as_ref()
            .map(|guard| guard.token().clone())
            .unwrap_or_else(CancellationToken::new);
        let request = self.transport_request(&descriptor)?;
        let mut state = RetryState::default();

        loop {
            let attempt = state.begin_attempt();
            let error = match self.attempt(&request, &descriptor, &token).await {
                Ok(body) => return Ok(self.interceptors.apply_success(body).await),
                Err(AttemptFailure::Recovered(body)) => {
                    debug!(method = %descriptor.method(), url = %request.url, attempt, "error recovered by interceptor");
                    return Ok(body);
                }
                Err(AttemptFailure::Undecodable(error)) => {
                    log_final_failure(&descriptor, &request.url, state.attempts(), &error);
                    return Err(error);
                }
                Err(AttemptFailure::Failed(error)) => error,
            };

            debug!(
                method = %descriptor.method(),
                url = %request.url,
                attempt,
                kind = %error.kind(),
                status = error.status(),
                "request attempt failed"
            );
            if !state.may_retry(&error, descriptor.retries(), descriptor.skip_retry()) {
                log_final_failure(&descriptor, &request.url, state.attempts(), &error);
                return Err(error);
            }

            let base = self.policy.base_delay_for(attempt.saturating_sub(1));
            let delay = state.schedule(
                self.runtime
                    .jitter
                    .jittered_delay(base, self.policy.max_jitter),
            );
            warn!(
                method = %descriptor.method(),
                url = %request.url,
                attempt,
                status = error.status(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying request after backoff"
            );
            state.record_failure(error);

            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(
                        method = %descriptor.method(),
                        url = %request.url,
                        attempts = state.attempts(),
                        pending_delay_ms = state.last_delay().map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                        last_status = state.last_error().map(HttpError::status),
                        "request cancelled during backoff"
                    );
                    return Err(HttpError::cancelled(descriptor.request_id()));
                }
                () = self.runtime.sleeper.sleep(delay) => {}
            }
        }
    }

    async fn attempt(
        &self,
        request: &TransportRequest,
        descriptor: &RequestDescriptor,
        token: &CancellationToken,
    ) -> Result<ParsedBody, AttemptFailure> {
        let window = descriptor.timeout();
        let send = tokio::time::timeout(window, self.transport.send(request.clone()));
        let response = tokio::select! {
            biased;
            () = token.cancelled() => {
                return Err(AttemptFailure::Failed(HttpError::cancelled(descriptor.request_id())));
            }
            outcome = send => match outcome {
                Err(_elapsed) => return Err(AttemptFailure::Failed(HttpError::timeout(window))),
                Ok(Err(error)) => return Err(AttemptFailure::Failed(map_transport_error(error, window))),
                Ok(Ok(response)) => response,
            },
        };
        self.classify(response).await
    }

    async fn classify(&self, response: TransportResponse) -> Result<ParsedBody, AttemptFailure> {
        let success = response.is_success();
        let TransportResponse {
            status,
            content_type,
            body,
        } = response;
        let parsed = ParsedBody::parse(content_type.as_deref(), body);
        if success {
            return parsed.map_err(AttemptFailure::Undecodable);
        }

        let payload = parsed.ok().and_then(ParsedBody::into_error_payload);
        let error = HttpError::from_status(status, payload);
        match self.interceptors.apply_error(error).await {
            ErrorDisposition::Recover(body) => Err(AttemptFailure::Recovered(body)),
            ErrorDisposition::Propagate(error) => Err(AttemptFailure::Failed(error)),
        }
    }

    fn transport_request(&self, descriptor: &RequestDescriptor) -> Result<TransportRequest, HttpError> {
        let mut headers = descriptor.headers().to_vec();
        if descriptor.header("content-type").is_none() {
            if let Some(content_type) = descriptor.body().content_type() {
                headers.push(("Content-Type".to_owned(), content_type.to_owned()));
            }
        }

        let body = match descriptor.body() {
            RequestBody::Empty => TransportBody::Empty,
            RequestBody::Json(value) => TransportBody::Bytes(serde_json::to_vec(value).map_err(
                |error| {
                    HttpError::network(format!("request body could not be encoded: {error}"))
                        .with_cause(error)
                },
            )?),
            RequestBody::Text(text) => TransportBody::Bytes(text.clone().into_bytes()),
            RequestBody::Bytes { data, .. } => TransportBody::Bytes(data.clone()),
            RequestBody::Form(fields) => TransportBody::Form(fields.clone()),
        };

        Ok(TransportRequest {
            method: descriptor.method(),
            url: resolve_url(&self.base_url, descriptor.url()),
            headers,
            body,
        })
    }
}

fn map_transport_error(error: TransportError, window: Duration) -> HttpError {
    match error {
        TransportError::Timeout { .. } => HttpError::timeout(window).with_cause(error),
        other => HttpError::network(other.to_string()).with_cause(other),
    }
}

fn log_final_failure(descriptor: &RequestDescriptor, url: &str, attempts: u32, error: &HttpError) {
    if error.is_cancelled() {
        debug!(method = %descriptor.method(), url, attempts, "request cancelled");
    } else {
        warn!(
            method = %descriptor.method(),
            url,
            attempts,
            kind = %error.kind(),
            status = error.status(),
            message = error.message(),
            "request failed"
        );
    }
}

/// Join a relative URL onto the base; absolute URLs pass through.
pub(crate) fn resolve_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || base.is_empty() {
        return url.to_owned();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}
