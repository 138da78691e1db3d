//! Multi-provider route resolution.
//!
//! The orchestrator owns no path-finding. It picks which provider to ask based
//! on the caller's preference and the mode, skips providers whose probe
//! reported them unavailable, walks the fallback chain until one answers, and
//! normalizes the answer with mode heuristics and dwell legs.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::HttpError;
use crate::domain::ports::RouteProvider;

mod capability;
mod heuristics;
mod query;
mod route;

pub use capability::{ProviderCapability, ProviderCapabilityCache, ProviderName};
pub use heuristics::{BUS_DURATION_FACTOR, TRAIN_DURATION_FACTOR, duration_factor};
pub use query::{
    Coordinate, ParseRoutingPreferenceError, RouteQuery, RoutingPreference, TransportMode,
};
pub use route::{ProviderLeg, ProviderRoute, RouteLeg, RouteResult, RoutingProfile};

/// Message of the error returned when no provider could be attempted.
pub const NO_PROVIDER_MESSAGE: &str = "no routing provider available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Primary,
    Secondary,
}

/// Resolves routes through a primary provider and an optional gated secondary.
pub struct RouteOrchestrator {
    primary: Arc<dyn RouteProvider>,
    secondary: Option<Arc<dyn RouteProvider>>,
    capabilities: Arc<ProviderCapabilityCache>,
}

impl RouteOrchestrator {
    /// Orchestrator with only a primary provider.
    pub fn new(primary: Arc<dyn RouteProvider>, capabilities: Arc<ProviderCapabilityCache>) -> Self {
        Self {
            primary,
            secondary: None,
            capabilities,
        }
    }

    /// Add the secondary provider, consulted only while its probe reports it
    /// available.
    #[must_use]
    pub fn with_secondary(mut self, secondary: Arc<dyn RouteProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Shared availability cache.
    pub fn capabilities(&self) -> &Arc<ProviderCapabilityCache> {
        &self.capabilities
    }

    /// Resolve `query` into a route.
    ///
    /// Returns `Ok(None)` when fewer than two valid waypoints remain after
    /// filtering. When every attempted provider fails the last error is
    /// returned; a cancelled call (superseded by a newer query with the same
    /// request key) ends resolution immediately.
    ///
    /// ```rust,ignore
    /// let query = RouteQuery::new(origin, destination, TransportMode::Train)
    ///     .with_request_key("day-2");
    /// if let Some(route) = orchestrator.resolve_route(&query).await? {
    ///     println!("{} min", route.duration_min);
    /// }
    /// ```
    pub async fn resolve_route(&self, query: &RouteQuery) -> Result<Option<RouteResult>, HttpError> {
        let waypoints = query.valid_waypoints();
        if waypoints.len() < 2 {
            debug!(
                supplied = query.waypoints().len(),
                valid = waypoints.len(),
                "route query skipped: fewer than two valid waypoints"
            );
            return Ok(None);
        }

        let mode = query.mode();
        let mut last_error = None;
        for (role, provider) in self.candidates(query) {
            let name = provider.name();
            if !self.is_available(role, provider.as_ref()).await {
                debug!(provider = %name, "skipping unavailable routing provider");
                continue;
            }

            let request_id = query
                .request_key()
                .map(|key| format!("route:{name}:{key}"));
            match provider.route(&waypoints, mode, request_id).await {
                Ok(route) => {
                    let result = heuristics::normalize(
                        route,
                        mode,
                        name,
                        query.dwell_per_stop(),
                        waypoints.len(),
                    );
                    info!(
                        provider = %name,
                        %mode,
                        distance_km = result.distance_km,
                        duration_min = result.duration_min,
                        "route resolved"
                    );
                    return Ok(Some(result));
                }
                Err(error) if error.is_cancelled() => {
                    debug!(provider = %name, %mode, "route request superseded");
                    return Err(error);
                }
                Err(error) => {
                    warn!(provider = %name, %mode, %error, "routing provider failed; trying next");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| HttpError::network(NO_PROVIDER_MESSAGE)))
    }

    fn candidates(&self, query: &RouteQuery) -> Vec<(Role, Arc<dyn RouteProvider>)> {
        let primary = (Role::Primary, Arc::clone(&self.primary));
        let Some(secondary) = self.secondary.as_ref() else {
            return vec![primary];
        };
        let secondary = (Role::Secondary, Arc::clone(secondary));

        let secondary_first = match query.preference() {
            RoutingPreference::Default => false,
            RoutingPreference::PreferTransitViaSecondary => query.mode().is_public_transit(),
            RoutingPreference::PreferSecondaryAlways => true,
        };
        if secondary_first {
            vec![secondary, primary]
        } else {
            vec![primary, secondary]
        }
    }

    /// The primary is never probed and is skipped only when it was recorded
    /// unavailable; the secondary is probed once and memoized.
    async fn is_available(&self, role: Role, provider: &dyn RouteProvider) -> bool {
        match role {
            Role::Primary => {
                self.capabilities.get(provider.name()) != ProviderCapability::Unavailable
            }
            Role::Secondary => self
                .capabilities
                .resolve_with(provider.name(), || provider.probe())
                .await
                .is_available(),
        }
    }
}
