//! Route query inputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude, -90 to 90.
    pub lat: f64,
    /// Longitude, -180 to 180.
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate without validating it.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// How the traveller moves between waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Walking,
    Cycling,
    Driving,
    Train,
    Bus,
}

impl TransportMode {
    /// Train and bus.
    pub fn is_public_transit(self) -> bool {
        matches!(self, Self::Train | Self::Bus)
    }

    /// Modes for which dwell time at intermediate stops is modelled.
    pub fn supports_dwell(self) -> bool {
        matches!(self, Self::Walking | Self::Cycling)
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Walking => "walking",
            Self::Cycling => "cycling",
            Self::Driving => "driving",
            Self::Train => "train",
            Self::Bus => "bus",
        };
        f.write_str(label)
    }
}

/// Which provider the orchestrator asks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingPreference {
    /// Primary first, secondary as fallback.
    #[default]
    Default,
    /// Secondary first for train and bus; otherwise as `Default`.
    PreferTransitViaSecondary,
    /// Secondary first for every mode.
    PreferSecondaryAlways,
}

/// Error returned when parsing a routing preference from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoutingPreferenceError(String);

impl fmt::Display for ParseRoutingPreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown routing preference `{}` (expected default, \
             prefer-transit-via-secondary or prefer-secondary-always)",
            self.0
        )
    }
}

impl std::error::Error for ParseRoutingPreferenceError {}

impl fmt::Display for RoutingPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Default => "default",
            Self::PreferTransitViaSecondary => "prefer-transit-via-secondary",
            Self::PreferSecondaryAlways => "prefer-secondary-always",
        };
        f.write_str(label)
    }
}

impl FromStr for RoutingPreference {
    type Err = ParseRoutingPreferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "default" => Ok(Self::Default),
            "prefer-transit-via-secondary" => Ok(Self::PreferTransitViaSecondary),
            "prefer-secondary-always" => Ok(Self::PreferSecondaryAlways),
            _ => Err(ParseRoutingPreferenceError(value.to_owned())),
        }
    }
}

/// Multi-waypoint route request, origin first and destination last.
///
/// # Examples
/// ```
/// use itinerary_client::domain::routing::{Coordinate, RouteQuery, TransportMode};
///
/// let query = RouteQuery::new(
///     Coordinate::new(51.5007, -0.1246),
///     Coordinate::new(51.5081, -0.0759),
///     TransportMode::Walking,
/// )
/// .via(Coordinate::new(51.5033, -0.1195))
/// .with_dwell_minutes(20);
/// assert_eq!(query.waypoints().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    waypoints: Vec<Coordinate>,
    mode: TransportMode,
    preference: RoutingPreference,
    dwell_per_stop: Option<u32>,
    request_key: Option<String>,
}

impl RouteQuery {
    /// Two-point query.
    pub fn new(origin: Coordinate, destination: Coordinate, mode: TransportMode) -> Self {
        Self::from_waypoints(vec![origin, destination], mode)
    }

    /// Query over an explicit waypoint list.
    pub fn from_waypoints(waypoints: Vec<Coordinate>, mode: TransportMode) -> Self {
        Self {
            waypoints,
            mode,
            preference: RoutingPreference::Default,
            dwell_per_stop: None,
            request_key: None,
        }
    }

    /// Insert an intermediate stop before the destination.
    #[must_use]
    pub fn via(mut self, stop: Coordinate) -> Self {
        let at = self.waypoints.len().saturating_sub(1);
        self.waypoints.insert(at, stop);
        self
    }

    /// Choose the provider ordering.
    #[must_use]
    pub fn with_preference(mut self, preference: RoutingPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Minutes spent at each intermediate stop (walking and cycling only).
    #[must_use]
    pub fn with_dwell_minutes(mut self, minutes: u32) -> Self {
        self.dwell_per_stop = Some(minutes);
        self
    }

    /// Key identifying this logical query; a newer query with the same key
    /// cancels provider calls still in flight for the older one.
    #[must_use]
    pub fn with_request_key(mut self, key: impl Into<String>) -> Self {
        self.request_key = Some(key.into());
        self
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn preference(&self) -> RoutingPreference {
        self.preference
    }

    pub fn dwell_per_stop(&self) -> Option<u32> {
        self.dwell_per_stop
    }

    pub fn request_key(&self) -> Option<&str> {
        self.request_key.as_deref()
    }

    /// Waypoints with invalid coordinates removed, order preserved.
    pub fn valid_waypoints(&self) -> Vec<Coordinate> {
        self.waypoints
            .iter()
            .copied()
            .filter(Coordinate::is_valid)
            .collect()
    }
}
