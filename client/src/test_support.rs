//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests or with the `test-support` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::domain::ports::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use crate::domain::request::{BackoffJitter, RetryRuntime, RetrySleeper};

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Answer immediately.
    Respond(TransportResponse),
    /// Fail at the transport level.
    Fail(TransportError),
    /// Answer after a real delay.
    Delayed(Duration, TransportResponse),
    /// Never answer; the call only settles through timeout or cancellation.
    Hang,
}

impl ScriptedReply {
    /// JSON response with `status`.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::Respond(json_response(status, body))
    }

    /// Empty-bodied response with `status`.
    pub fn status(status: u16) -> Self {
        Self::Respond(TransportResponse {
            status,
            content_type: None,
            body: Vec::new(),
        })
    }
}

/// Build a JSON transport response.
pub fn json_response(status: u16, body: &Value) -> TransportResponse {
    TransportResponse {
        status,
        content_type: Some("application/json".to_owned()),
        body: body.to_string().into_bytes(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("test double mutex poisoned"),
    }
}

/// Transport that replays a script and records every request it receives.
///
/// Once the script is exhausted the `fallback` reply (if any) repeats;
/// otherwise calls fail with a transport error.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<ScriptedReply>,
    requests: Mutex<Vec<TransportRequest>>,
    entered: Option<mpsc::UnboundedSender<usize>>,
}

impl ScriptedTransport {
    /// Replay `replies` in order.
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            entered: None,
        }
    }

    /// Answer every call with `reply`.
    pub fn repeating(reply: ScriptedReply) -> Self {
        Self {
            fallback: Some(reply),
            ..Self::new(Vec::new())
        }
    }

    /// Send the running call count on `entered` whenever a call starts.
    #[must_use]
    pub fn with_entry_signal(mut self, entered: mpsc::UnboundedSender<usize>) -> Self {
        self.entered = Some(entered);
        self
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        lock(&self.requests).clone()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        lock(&self.script)
            .pop_front()
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let count = {
            let mut requests = lock(&self.requests);
            requests.push(request);
            requests.len()
        };
        if let Some(entered) = &self.entered {
            // The receiver may already be gone in tests that stop listening.
            let _ = entered.send(count);
        }
        match self.next_reply() {
            Some(ScriptedReply::Respond(response)) => Ok(response),
            Some(ScriptedReply::Fail(error)) => Err(error),
            Some(ScriptedReply::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Err(TransportError::connect("transport script exhausted")),
        }
    }
}

/// Sleeper that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl RetrySleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Delays requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0).push(duration);
    }
}

/// Jitter strategy that returns the base delay unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _max_jitter: Duration) -> Duration {
        base
    }
}

/// Retry runtime that never waits.
pub fn immediate_runtime() -> RetryRuntime {
    RetryRuntime {
        sleeper: Arc::new(ImmediateSleeper),
        jitter: Arc::new(NoJitter),
    }
}
