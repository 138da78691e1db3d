//! Vector maps directions adapter (primary routing provider).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::dto::{DirectionsResponseDto, TokenCheckDto};
use super::{coordinate_path, endpoint, provider_options};
use crate::domain::HttpError;
use crate::domain::ports::RouteProvider;
use crate::domain::request::{RequestExecutor, RequestOptions};
use crate::domain::routing::{
    Coordinate, ProviderName, ProviderRoute, RoutingProfile, TransportMode,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const VALID_TOKEN_CODE: &str = "TokenValid";

/// Road-network directions through the vector maps provider.
///
/// Train and bus journeys are routed on the driving profile; the orchestrator
/// adjusts their durations.
pub struct VectorMapsRouteProvider {
    executor: Arc<RequestExecutor>,
    base_url: Url,
    access_token: String,
}

impl VectorMapsRouteProvider {
    /// Adapter calling `base_url` through `executor`. A blank token makes
    /// the provider probe as unavailable.
    pub fn new(executor: Arc<RequestExecutor>, base_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            executor,
            base_url,
            access_token: access_token.into(),
        }
    }

    fn directions_url(&self, waypoints: &[Coordinate], profile: &str) -> Result<Url, HttpError> {
        let path = format!(
            "directions/v5/mapbox/{profile}/{}",
            coordinate_path(waypoints)
        );
        let mut url = endpoint(&self.base_url, &path)?;
        url.query_pairs_mut()
            .append_pair("geometries", "geojson")
            .append_pair("overview", "full")
            .append_pair("steps", "false")
            .append_pair("access_token", &self.access_token);
        Ok(url)
    }
}

fn profile_for(mode: TransportMode) -> (&'static str, RoutingProfile) {
    match mode {
        TransportMode::Walking => ("walking", RoutingProfile::Walking),
        TransportMode::Cycling => ("cycling", RoutingProfile::Cycling),
        TransportMode::Driving | TransportMode::Train | TransportMode::Bus => {
            ("driving", RoutingProfile::Driving)
        }
    }
}

#[async_trait]
impl RouteProvider for VectorMapsRouteProvider {
    fn name(&self) -> ProviderName {
        ProviderName::MAPS_VECTOR
    }

    async fn route(
        &self,
        waypoints: &[Coordinate],
        mode: TransportMode,
        request_id: Option<String>,
    ) -> Result<ProviderRoute, HttpError> {
        let (segment, profile) = profile_for(mode);
        let url = self.directions_url(waypoints, segment)?;
        let body = self
            .executor
            .get(url.as_str(), provider_options(request_id))
            .await?;
        body.json::<DirectionsResponseDto>()?
            .into_provider_route(self.name(), profile)
    }

    async fn probe(&self) -> Result<bool, HttpError> {
        if self.access_token.trim().is_empty() {
            return Ok(false);
        }
        let mut url = endpoint(&self.base_url, "tokens/v2")?;
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token);
        let options = RequestOptions {
            timeout: Some(PROBE_TIMEOUT),
            skip_retry: true,
            ..RequestOptions::default()
        };
        let body = self.executor.get(url.as_str(), options).await?;
        Ok(body.json::<TokenCheckDto>()?.code == VALID_TOKEN_CODE)
    }
}
