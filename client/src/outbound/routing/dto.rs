//! DTOs for decoding routing provider responses.
//!
//! Each adapter decodes into these transport DTOs first, then maps into a
//! domain `ProviderRoute` in one pass. Providers report metres and seconds.

use serde::Deserialize;
use serde_json::json;

use crate::domain::HttpError;
use crate::domain::routing::{Coordinate, ProviderLeg, ProviderName, ProviderRoute, RoutingProfile};

const METRES_PER_KM: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Status reported when a provider answered successfully but found no route.
const NO_ROUTE_STATUS: u16 = 404;

#[derive(Debug, Deserialize)]
pub(super) struct LineStringDto {
    #[serde(default)]
    pub(super) coordinates: Vec<[f64; 2]>,
}

impl LineStringDto {
    fn into_coordinates(self) -> Vec<Coordinate> {
        self.coordinates
            .into_iter()
            .map(|[lon, lat]| Coordinate::new(lat, lon))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SpanDto {
    #[serde(default)]
    pub(super) distance: f64,
    #[serde(default)]
    pub(super) duration: f64,
}

impl SpanDto {
    fn into_leg(self) -> ProviderLeg {
        ProviderLeg {
            distance_km: self.distance / METRES_PER_KM,
            duration_min: self.duration / SECONDS_PER_MINUTE,
        }
    }
}

/// Vector maps directions response.
#[derive(Debug, Deserialize)]
pub(super) struct DirectionsResponseDto {
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) routes: Vec<DirectionsRouteDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DirectionsRouteDto {
    pub(super) distance: f64,
    pub(super) duration: f64,
    pub(super) geometry: LineStringDto,
    #[serde(default)]
    pub(super) legs: Vec<SpanDto>,
}

impl DirectionsResponseDto {
    pub(super) fn into_provider_route(
        self,
        provider: ProviderName,
        profile: RoutingProfile,
    ) -> Result<ProviderRoute, HttpError> {
        let code = self.code;
        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| no_route(provider, code.as_deref()))?;
        Ok(ProviderRoute {
            geometry: route.geometry.into_coordinates(),
            distance_km: route.distance / METRES_PER_KM,
            duration_min: route.duration / SECONDS_PER_MINUTE,
            profile,
            legs: route.legs.into_iter().map(SpanDto::into_leg).collect(),
        })
    }
}

/// Open routing service GeoJSON response.
#[derive(Debug, Deserialize)]
pub(super) struct FeatureCollectionDto {
    #[serde(default)]
    pub(super) features: Vec<FeatureDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FeatureDto {
    pub(super) geometry: LineStringDto,
    pub(super) properties: FeaturePropertiesDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct FeaturePropertiesDto {
    pub(super) summary: SpanDto,
    #[serde(default)]
    pub(super) segments: Vec<SpanDto>,
}

impl FeatureCollectionDto {
    pub(super) fn into_provider_route(
        self,
        provider: ProviderName,
        profile: RoutingProfile,
    ) -> Result<ProviderRoute, HttpError> {
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or_else(|| no_route(provider, None))?;
        let FeaturePropertiesDto { summary, segments } = feature.properties;
        Ok(ProviderRoute {
            geometry: feature.geometry.into_coordinates(),
            distance_km: summary.distance / METRES_PER_KM,
            duration_min: summary.duration / SECONDS_PER_MINUTE,
            profile,
            legs: segments.into_iter().map(SpanDto::into_leg).collect(),
        })
    }
}

/// Open routing service health response.
#[derive(Debug, Deserialize)]
pub(super) struct HealthDto {
    #[serde(default)]
    pub(super) status: String,
}

/// Vector maps token validation response.
#[derive(Debug, Deserialize)]
pub(super) struct TokenCheckDto {
    #[serde(default)]
    pub(super) code: String,
}

fn no_route(provider: ProviderName, code: Option<&str>) -> HttpError {
    let detail = code.map_or_else(String::new, |code| format!(" ({code})"));
    HttpError::from_status(
        NO_ROUTE_STATUS,
        Some(json!({ "message": format!("{provider} found no route{detail}") })),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn directions_convert_units_and_swap_axis_order() {
        let dto: DirectionsResponseDto = serde_json::from_value(json!({
            "code": "Ok",
            "routes": [{
                "distance": 1500.0,
                "duration": 900.0,
                "geometry": { "type": "LineString", "coordinates": [[-0.12, 51.50], [-0.07, 51.51]] },
                "legs": [{ "distance": 1500.0, "duration": 900.0 }]
            }]
        }))
        .expect("decodes");

        let route = dto
            .into_provider_route(ProviderName::MAPS_VECTOR, RoutingProfile::Walking)
            .expect("route");
        assert_eq!(route.geometry[0], Coordinate::new(51.50, -0.12));
        assert!((route.distance_km - 1.5).abs() < 1e-9);
        assert!((route.duration_min - 15.0).abs() < 1e-9);
        assert_eq!(route.legs.len(), 1);
    }

    #[test]
    fn empty_answers_are_not_found_errors() {
        let dto: DirectionsResponseDto =
            serde_json::from_value(json!({ "code": "NoRoute", "routes": [] })).expect("decodes");
        let error = dto
            .into_provider_route(ProviderName::MAPS_VECTOR, RoutingProfile::Driving)
            .expect_err("no route");
        assert_eq!(error.status(), 404);
        assert_eq!(error.message(), "maps-vector-provider found no route (NoRoute)");
        assert!(!error.is_retryable());
    }
}
