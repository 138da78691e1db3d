//! Driven port for third-party multi-waypoint routing services.
//!
//! Providers compute routes; the orchestrator only chooses which provider to
//! ask and normalizes what comes back.

use async_trait::async_trait;

use crate::domain::HttpError;
use crate::domain::routing::{Coordinate, ProviderName, ProviderRoute, TransportMode};

/// Port for one external routing provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Stable provider name, used as the capability cache key.
    fn name(&self) -> ProviderName;

    /// Compute a route through `waypoints` in order.
    ///
    /// `request_id` is forwarded to the execution engine so a newer call under
    /// the same id cancels this one.
    async fn route(
        &self,
        waypoints: &[Coordinate],
        mode: TransportMode,
        request_id: Option<String>,
    ) -> Result<ProviderRoute, HttpError>;

    /// Ask the provider's status endpoint whether it is reachable and configured.
    async fn probe(&self) -> Result<bool, HttpError>;
}
