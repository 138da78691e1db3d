//! Domain layer: request orchestration independent of any HTTP client.
//!
//! Purpose: classify failures, execute requests with retry and cancellation,
//! choose between routing providers and keep optimistic local state
//! consistent with the server. Outbound adapters implement the ports in
//! [`ports`]; nothing here depends on them.
//!
//! Public surface:
//! - `HttpError` / `HttpErrorKind`: the failure taxonomy every call returns.
//! - `request::RequestExecutor`: retrying, cancellable execution engine.
//! - `routing::RouteOrchestrator`: multi-provider route resolution.
//! - `mutation::OptimisticCoordinator`: snapshot, apply, reconcile, roll back.
//! - `itinerary::ItineraryScheduler`: scheduling and voting on trip POIs.

pub mod error;
pub mod itinerary;
pub mod mutation;
pub mod ports;
pub mod request;
pub mod routing;

pub use self::error::{
    CANCELLED_STATUS, ErrorCause, HttpError, HttpErrorKind, NETWORK_STATUS, TIMEOUT_STATUS,
};
