//! Provider answers and the normalized route handed to callers.

use serde::{Deserialize, Serialize};

use super::{Coordinate, ProviderName, TransportMode};

/// Network profile a provider actually computed the route on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingProfile {
    Driving,
    Walking,
    Cycling,
    /// Scheduled public transport; no mode heuristic applies.
    ///
    /// The bundled adapters are road-network providers and never report it.
    /// A transit-aware `RouteProvider` returns it so its train and bus
    /// timings are passed through unscaled.
    Transit,
}

/// One leg of a provider answer, between consecutive waypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderLeg {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Raw route as returned by a provider, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    pub geometry: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub profile: RoutingProfile,
    pub legs: Vec<ProviderLeg>,
}

/// Leg of a normalized route, with dwell time at the arrival stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    /// Index of the departure waypoint.
    pub from_index: usize,
    /// Index of the arrival waypoint.
    pub to_index: usize,
    pub distance_km: f64,
    pub travel_min: f64,
    /// Minutes spent at the arrival stop; zero at the destination.
    pub dwell_min: f64,
}

/// Normalized route. `mode` is always the requested mode, even when the
/// provider computed the route on a different network.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub geometry: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub mode: TransportMode,
    pub provider: ProviderName,
    pub legs: Option<Vec<RouteLeg>>,
}
