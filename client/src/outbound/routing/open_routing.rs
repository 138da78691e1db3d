//! Open routing service adapter (secondary routing provider).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::dto::{FeatureCollectionDto, HealthDto};
use super::{endpoint, provider_options};
use crate::domain::HttpError;
use crate::domain::ports::RouteProvider;
use crate::domain::request::{RequestBody, RequestExecutor, RequestOptions};
use crate::domain::routing::{
    Coordinate, ProviderName, ProviderRoute, RoutingProfile, TransportMode,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const READY_STATUS: &str = "ready";

/// Road-network directions through an open routing service instance.
///
/// Self-hosted instances usually run without an API key; hosted ones
/// require it in the `Authorization` header.
pub struct OpenRouteServiceProvider {
    executor: Arc<RequestExecutor>,
    base_url: Url,
    api_key: Option<String>,
}

impl OpenRouteServiceProvider {
    /// Adapter calling `base_url` through `executor`; blank keys are ignored.
    pub fn new(executor: Arc<RequestExecutor>, base_url: Url, api_key: Option<String>) -> Self {
        Self {
            executor,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    fn authorize(&self, mut options: RequestOptions) -> RequestOptions {
        if let Some(key) = &self.api_key {
            options.headers.push(("Authorization".to_owned(), key.clone()));
        }
        options
    }
}

fn profile_for(mode: TransportMode) -> (&'static str, RoutingProfile) {
    match mode {
        TransportMode::Walking => ("foot-walking", RoutingProfile::Walking),
        TransportMode::Cycling => ("cycling-regular", RoutingProfile::Cycling),
        TransportMode::Driving | TransportMode::Train | TransportMode::Bus => {
            ("driving-car", RoutingProfile::Driving)
        }
    }
}

#[async_trait]
impl RouteProvider for OpenRouteServiceProvider {
    fn name(&self) -> ProviderName {
        ProviderName::OPEN_ROUTING_SERVICE
    }

    async fn route(
        &self,
        waypoints: &[Coordinate],
        mode: TransportMode,
        request_id: Option<String>,
    ) -> Result<ProviderRoute, HttpError> {
        let (segment, profile) = profile_for(mode);
        let url = endpoint(&self.base_url, &format!("v2/directions/{segment}/geojson"))?;
        let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|point| [point.lon, point.lat]).collect();
        let body = self
            .executor
            .post(
                url.as_str(),
                RequestBody::Json(json!({ "coordinates": coordinates })),
                self.authorize(provider_options(request_id)),
            )
            .await?;
        body.json::<FeatureCollectionDto>()?
            .into_provider_route(self.name(), profile)
    }

    async fn probe(&self) -> Result<bool, HttpError> {
        let url = endpoint(&self.base_url, "v2/health")?;
        let options = RequestOptions {
            timeout: Some(PROBE_TIMEOUT),
            skip_retry: true,
            ..RequestOptions::default()
        };
        let body = self.executor.get(url.as_str(), options).await?;
        Ok(body.json::<HealthDto>()?.status == READY_STATUS)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::TransportBody;
    use crate::test_support::{ScriptedReply, ScriptedTransport, immediate_runtime};

    fn adapter(transport: Arc<ScriptedTransport>, api_key: Option<&str>) -> OpenRouteServiceProvider {
        let executor = RequestExecutor::new(transport, "").with_runtime(immediate_runtime());
        let base = Url::parse("https://ors.example.test/ors/").expect("valid url");
        OpenRouteServiceProvider::new(Arc::new(executor), base, api_key.map(str::to_owned))
    }

    fn geojson() -> ScriptedReply {
        ScriptedReply::json(
            200,
            &json!({
                "features": [{
                    "geometry": { "coordinates": [[13.38, 52.52], [13.45, 52.50]] },
                    "properties": {
                        "summary": { "distance": 6000.0, "duration": 1800.0 },
                        "segments": [{ "distance": 6000.0, "duration": 1800.0 }]
                    }
                }]
            }),
        )
    }

    #[tokio::test]
    async fn posts_lon_lat_pairs_with_api_key() {
        let transport = Arc::new(ScriptedTransport::new(vec![geojson()]));
        let provider = adapter(transport.clone(), Some("ors-key"));

        let route = provider
            .route(
                &[Coordinate::new(52.52, 13.38), Coordinate::new(52.50, 13.45)],
                TransportMode::Cycling,
                None,
            )
            .await
            .expect("route");

        assert_eq!(route.profile, RoutingProfile::Cycling);
        assert!((route.duration_min - 30.0).abs() < 1e-9);
        let sent = transport.requests();
        let request = &sent[0];
        assert_eq!(
            request.url,
            "https://ors.example.test/ors/v2/directions/cycling-regular/geojson"
        );
        assert!(
            request
                .headers
                .contains(&("Authorization".to_owned(), "ors-key".to_owned()))
        );
        let TransportBody::Bytes(bytes) = &request.body else {
            panic!("json body expected");
        };
        let sent_body: serde_json::Value = serde_json::from_slice(bytes).expect("json");
        assert_eq!(sent_body, json!({ "coordinates": [[13.38, 52.52], [13.45, 52.50]] }));
    }

    #[rstest]
    #[case(json!({ "status": "ready" }), true)]
    #[case(json!({ "status": "not ready" }), false)]
    #[tokio::test]
    async fn probe_reads_health_status(#[case] health: serde_json::Value, #[case] expected: bool) {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedReply::json(200, &health)]));
        let provider = adapter(transport.clone(), None);

        assert_eq!(provider.probe().await, Ok(expected));
        assert_eq!(transport.requests()[0].url, "https://ors.example.test/ors/v2/health");
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let provider = adapter(Arc::new(ScriptedTransport::new(Vec::new())), Some("  "));
        assert!(provider.authorize(RequestOptions::default()).headers.is_empty());
    }
}
