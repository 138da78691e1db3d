//! Backoff policy and the runtime seams used while waiting between attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::domain::HttpError;

/// Default exponential backoff base.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Default upper bound of the random jitter added to each delay.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1_000);

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry, doubled for each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to every delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BACKOFF_BASE,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay before retry number `retry` (0-based).
    pub fn base_delay_for(&self, retry: u32) -> Duration {
        let factor = 2_u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Attempt bookkeeping for one logical request.
///
/// Owned by a single `execute` invocation and never shared.
#[derive(Debug, Default)]
pub(crate) struct RetryState {
    attempt: u32,
    last_delay: Option<Duration>,
    last_error: Option<HttpError>,
}

impl RetryState {
    /// Number of attempts already started.
    pub(crate) fn attempts(&self) -> u32 {
        self.attempt
    }

    pub(crate) fn begin_attempt(&mut self) -> u32 {
        self.attempt = self.attempt.saturating_add(1);
        self.attempt
    }

    /// Whether another attempt is allowed after `error`.
    pub(crate) fn may_retry(&self, error: &HttpError, retries: u32, skip_retry: bool) -> bool {
        !skip_retry && error.is_retryable() && self.attempt <= retries
    }

    pub(crate) fn record_failure(&mut self, error: HttpError) {
        self.last_error = Some(error);
    }

    pub(crate) fn schedule(&mut self, delay: Duration) -> Duration {
        self.last_delay = Some(delay);
        delay
    }

    pub(crate) fn last_delay(&self) -> Option<Duration> {
        self.last_delay
    }

    pub(crate) fn last_error(&self) -> Option<&HttpError> {
        self.last_error.as_ref()
    }
}

/// Async sleeping abstraction so tests can skip real waits.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Jitter strategy applied on top of the exponential base delay.
pub trait BackoffJitter: Send + Sync {
    /// Return the delay to wait, given the base delay and the jitter bound.
    fn jittered_delay(&self, base: Duration, max_jitter: Duration) -> Duration;
}

/// Runtime helpers used by the retry loop.
#[derive(Clone)]
pub struct RetryRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for RetryRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }
}

/// Tokio-based sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform jitter in `0..=max_jitter` milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, max_jitter: Duration) -> Duration {
        let bound = u64::try_from(max_jitter.as_millis()).unwrap_or(u64::MAX);
        if bound == 0 {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0..=bound);
        base.saturating_add(Duration::from_millis(extra))
    }
}
