//! Ordered interceptor pipelines with unregister handles.
//!
//! Request interceptors rewrite the descriptor before dispatch. Response
//! interceptors observe successful bodies and may recover from errors with a
//! substitute body (session refresh lives outside this crate and plugs in
//! here). Both run in registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;

use super::{ParsedBody, RequestDescriptor};
use crate::domain::HttpError;

/// Rewrites a descriptor before it is dispatched.
pub trait RequestInterceptor: Send + Sync {
    /// Return the descriptor to send.
    fn intercept(&self, descriptor: RequestDescriptor) -> RequestDescriptor;
}

impl<F> RequestInterceptor for F
where
    F: Fn(RequestDescriptor) -> RequestDescriptor + Send + Sync,
{
    fn intercept(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        self(descriptor)
    }
}

/// Outcome of an error interceptor.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDisposition {
    /// Keep failing, possibly with a rewritten error.
    Propagate(HttpError),
    /// Stop the error path and resolve the request with this body.
    Recover(ParsedBody),
}

/// Observes responses; may turn an error into a recovered value.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Called with each successful body; returns the body passed on.
    async fn on_success(&self, body: ParsedBody) -> ParsedBody {
        body
    }

    /// Called with each non-2xx error.
    async fn on_error(&self, error: HttpError) -> ErrorDisposition {
        ErrorDisposition::Propagate(error)
    }
}

type RequestSlots = Vec<(u64, Arc<dyn RequestInterceptor>)>;
type ResponseSlots = Vec<(u64, Arc<dyn ResponseInterceptor>)>;

#[derive(Default)]
pub(crate) struct InterceptorChain {
    next_id: AtomicU64,
    request: Mutex<RequestSlots>,
    response: Mutex<ResponseSlots>,
}

impl InterceptorChain {
    pub(crate) fn add_request(
        self: &Arc<Self>,
        interceptor: Arc<dyn RequestInterceptor>,
    ) -> InterceptorHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.request).push((id, interceptor));
        InterceptorHandle {
            chain: Arc::downgrade(self),
            slot: Slot::Request(id),
        }
    }

    pub(crate) fn add_response(
        self: &Arc<Self>,
        interceptor: Arc<dyn ResponseInterceptor>,
    ) -> InterceptorHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.response).push((id, interceptor));
        InterceptorHandle {
            chain: Arc::downgrade(self),
            slot: Slot::Response(id),
        }
    }

    pub(crate) fn apply_request(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        let interceptors: Vec<_> = lock(&self.request)
            .iter()
            .map(|(_, interceptor)| Arc::clone(interceptor))
            .collect();
        interceptors
            .iter()
            .fold(descriptor, |acc, interceptor| interceptor.intercept(acc))
    }

    pub(crate) async fn apply_success(&self, body: ParsedBody) -> ParsedBody {
        let mut current = body;
        for interceptor in self.response_snapshot() {
            current = interceptor.on_success(current).await;
        }
        current
    }

    pub(crate) async fn apply_error(&self, error: HttpError) -> ErrorDisposition {
        let mut current = error;
        for interceptor in self.response_snapshot() {
            match interceptor.on_error(current).await {
                ErrorDisposition::Propagate(next) => current = next,
                recovered @ ErrorDisposition::Recover(_) => return recovered,
            }
        }
        ErrorDisposition::Propagate(current)
    }

    fn response_snapshot(&self) -> Vec<Arc<dyn ResponseInterceptor>> {
        lock(&self.response)
            .iter()
            .map(|(_, interceptor)| Arc::clone(interceptor))
            .collect()
    }

    fn remove(&self, slot: Slot) -> bool {
        match slot {
            Slot::Request(id) => remove_slot(&mut lock(&self.request), id),
            Slot::Response(id) => remove_slot(&mut lock(&self.response), id),
        }
    }
}

fn remove_slot<T: ?Sized>(slots: &mut Vec<(u64, Arc<T>)>, id: u64) -> bool {
    let before = slots.len();
    slots.retain(|(slot_id, _)| *slot_id != id);
    slots.len() != before
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Request(u64),
    Response(u64),
}

/// Token returned on registration; call [`InterceptorHandle::unregister`] to
/// remove the interceptor. Dropping the handle keeps the interceptor installed.
#[derive(Debug)]
pub struct InterceptorHandle {
    chain: Weak<InterceptorChain>,
    slot: Slot,
}

impl InterceptorHandle {
    /// Remove the interceptor; returns `false` if it was already gone.
    pub fn unregister(self) -> bool {
        self.chain
            .upgrade()
            .is_some_and(|chain| chain.remove(self.slot))
    }
}
