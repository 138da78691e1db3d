//! Client configuration loaded via OrthoConfig.
//!
//! Engine tuning values carry OrthoConfig defaults matching the engine's own;
//! URLs and credentials are optional and fall back in their accessors, so a
//! host application can run with no configuration at all. Values come from
//! `ITINERARY_CLIENT_*` environment variables, configuration files and CLI
//! arguments in the usual OrthoConfig precedence.

use std::sync::Arc;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::ports::HttpTransport;
use crate::domain::request::{ExecutorDefaults, RequestExecutor, RetryPolicy};
use crate::domain::routing::{
    Coordinate, ParseRoutingPreferenceError, ProviderCapabilityCache, ProviderName, RouteOrchestrator,
    RouteQuery, RoutingPreference, TransportMode,
};
use crate::outbound::routing::{OpenRouteServiceProvider, VectorMapsRouteProvider};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_MAPS_VECTOR_BASE_URL: &str = "https://api.mapbox.com";
const DEFAULT_OPEN_ROUTING_BASE_URL: &str = "https://api.openrouteservice.org";

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL setting could not be parsed.
    #[error("invalid {setting} `{value}`: {source}")]
    InvalidUrl {
        /// Name of the offending setting.
        setting: &'static str,
        /// Raw configured value.
        value: String,
        /// Parser failure.
        source: url::ParseError,
    },
    /// The routing preference is not one of the known values.
    #[error(transparent)]
    RoutingPreference(#[from] ParseRoutingPreferenceError),
}

/// Settings for the request engine and the routing providers.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ITINERARY_CLIENT")]
pub struct ClientSettings {
    /// Base URL of the trip API; relative request URLs resolve against it.
    pub api_base_url: Option<String>,
    /// Per-attempt timeout window in milliseconds.
    #[ortho_config(default = 30000)]
    pub request_timeout_ms: u64,
    /// Retries after the first attempt.
    #[ortho_config(default = 3)]
    pub retries: u32,
    /// Delay before the first retry in milliseconds.
    #[ortho_config(default = 1000)]
    pub backoff_base_ms: u64,
    /// Upper bound of the backoff jitter in milliseconds.
    #[ortho_config(default = 1000)]
    pub max_jitter_ms: u64,
    /// Base URL of the primary (vector maps) routing provider.
    pub maps_vector_base_url: Option<String>,
    /// Access token of the primary routing provider.
    pub maps_vector_token: Option<String>,
    /// Base URL of the secondary (open routing service) provider.
    pub open_routing_base_url: Option<String>,
    /// API key of the secondary provider; self-hosted instances need none.
    pub open_routing_api_key: Option<String>,
    /// Default provider ordering for route queries.
    pub routing_preference: Option<String>,
}

fn parse_url(setting: &'static str, value: Option<&str>, default: &str) -> Result<Url, ConfigError> {
    let raw = value.unwrap_or(default);
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        setting,
        value: raw.to_owned(),
        source,
    })
}

impl ClientSettings {
    /// Trip API base URL, falling back to the local development server.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        parse_url("api_base_url", self.api_base_url.as_deref(), DEFAULT_API_BASE_URL)
    }

    /// Timeout and retry budget for the verb helpers.
    pub fn executor_defaults(&self) -> ExecutorDefaults {
        ExecutorDefaults {
            timeout: Duration::from_millis(self.request_timeout_ms),
            retries: self.retries,
        }
    }

    /// Backoff policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }

    /// Primary provider base URL, falling back to the public endpoint.
    pub fn maps_vector_base_url(&self) -> Result<Url, ConfigError> {
        parse_url(
            "maps_vector_base_url",
            self.maps_vector_base_url.as_deref(),
            DEFAULT_MAPS_VECTOR_BASE_URL,
        )
    }

    /// Secondary provider base URL, falling back to the hosted service.
    pub fn open_routing_base_url(&self) -> Result<Url, ConfigError> {
        parse_url(
            "open_routing_base_url",
            self.open_routing_base_url.as_deref(),
            DEFAULT_OPEN_ROUTING_BASE_URL,
        )
    }

    /// Configured primary token, with surrounding whitespace removed.
    pub fn maps_vector_token(&self) -> &str {
        self.maps_vector_token.as_deref().map_or("", str::trim)
    }

    /// Default routing preference; [`Self::route_query`] applies it.
    pub fn routing_preference(&self) -> Result<RoutingPreference, ConfigError> {
        match self.routing_preference.as_deref() {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(RoutingPreference::default()),
        }
    }

    /// Route query from `origin` to `destination` carrying the configured
    /// routing preference. Callers can still override it per query.
    pub fn route_query(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TransportMode,
    ) -> Result<RouteQuery, ConfigError> {
        Ok(RouteQuery::new(origin, destination, mode).with_preference(self.routing_preference()?))
    }

    /// Request executor over `transport` configured from these settings.
    pub fn request_executor(
        &self,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<RequestExecutor, ConfigError> {
        Ok(RequestExecutor::new(transport, self.api_base_url()?.as_str())
            .with_defaults(self.executor_defaults())
            .with_policy(self.retry_policy()))
    }

    /// Route orchestrator with both providers sharing `executor`.
    ///
    /// Without an access token the primary provider is recorded as
    /// unavailable up front, so resolution goes straight to the secondary.
    pub fn route_orchestrator(
        &self,
        executor: &Arc<RequestExecutor>,
    ) -> Result<RouteOrchestrator, ConfigError> {
        let capabilities = Arc::new(ProviderCapabilityCache::new());
        let token = self.maps_vector_token();
        if token.is_empty() {
            capabilities.record(ProviderName::MAPS_VECTOR, false);
        }
        let primary = VectorMapsRouteProvider::new(
            Arc::clone(executor),
            self.maps_vector_base_url()?,
            token,
        );
        let secondary = OpenRouteServiceProvider::new(
            Arc::clone(executor),
            self.open_routing_base_url()?,
            self.open_routing_api_key.clone(),
        );
        Ok(RouteOrchestrator::new(Arc::new(primary), capabilities).with_secondary(Arc::new(secondary)))
    }
}
