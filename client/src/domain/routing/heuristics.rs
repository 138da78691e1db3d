//! Duration adjustments and dwell legs applied to provider answers.
//!
//! Road-network providers cannot time scheduled transport. Trains are
//! modelled as faster than driving the same corridor and buses as slower;
//! the factors only apply when the provider did not compute a transit
//! profile itself. Distances are never adjusted.

use super::{ProviderName, ProviderRoute, RouteLeg, RouteResult, RoutingProfile, TransportMode};

/// Duration multiplier for train journeys timed on a non-transit profile.
pub const TRAIN_DURATION_FACTOR: f64 = 0.75;
/// Duration multiplier for bus journeys timed on a non-transit profile.
pub const BUS_DURATION_FACTOR: f64 = 1.2;

/// Multiplier applied to the provider's duration for `mode`.
pub fn duration_factor(mode: TransportMode, profile: RoutingProfile) -> f64 {
    if profile == RoutingProfile::Transit {
        return 1.0;
    }
    match mode {
        TransportMode::Train => TRAIN_DURATION_FACTOR,
        TransportMode::Bus => BUS_DURATION_FACTOR,
        TransportMode::Walking | TransportMode::Cycling | TransportMode::Driving => 1.0,
    }
}

/// Turn a provider answer into the caller-facing result.
///
/// `waypoint_count` is the number of valid waypoints sent to the provider.
pub(crate) fn normalize(
    route: ProviderRoute,
    mode: TransportMode,
    provider: ProviderName,
    dwell_per_stop: Option<u32>,
    waypoint_count: usize,
) -> RouteResult {
    let factor = duration_factor(mode, route.profile);
    let travel_min = route.duration_min * factor;
    let legs = dwell_legs(&route, mode, dwell_per_stop, waypoint_count, factor);
    let dwell_total: f64 = legs
        .iter()
        .flatten()
        .map(|leg| leg.dwell_min)
        .sum();

    RouteResult {
        geometry: route.geometry,
        distance_km: route.distance_km,
        duration_min: travel_min + dwell_total,
        mode,
        provider,
        legs,
    }
}

fn dwell_legs(
    route: &ProviderRoute,
    mode: TransportMode,
    dwell_per_stop: Option<u32>,
    waypoint_count: usize,
    factor: f64,
) -> Option<Vec<RouteLeg>> {
    let dwell = f64::from(dwell_per_stop?);
    if !mode.supports_dwell() || waypoint_count <= 2 {
        return None;
    }
    let last = waypoint_count - 1;
    let legs = if route.legs.len() == last {
        route
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| RouteLeg {
                from_index: index,
                to_index: index + 1,
                distance_km: leg.distance_km,
                travel_min: leg.duration_min * factor,
                dwell_min: if index + 1 < last { dwell } else { 0.0 },
            })
            .collect()
    } else {
        // Provider did not split the route per waypoint; spread it evenly.
        let share = 1.0 / last as f64;
        (0..last)
            .map(|index| RouteLeg {
                from_index: index,
                to_index: index + 1,
                distance_km: route.distance_km * share,
                travel_min: route.duration_min * factor * share,
                dwell_min: if index + 1 < last { dwell } else { 0.0 },
            })
            .collect()
    };
    Some(legs)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::routing::{Coordinate, ProviderLeg};

    fn route(profile: RoutingProfile, duration_min: f64, legs: Vec<ProviderLeg>) -> ProviderRoute {
        ProviderRoute {
            geometry: vec![Coordinate::new(40.7, -74.0), Coordinate::new(34.0, -118.2)],
            distance_km: 3935.0,
            duration_min,
            profile,
            legs,
        }
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[rstest]
    #[case(TransportMode::Train, RoutingProfile::Driving, 0.75)]
    #[case(TransportMode::Bus, RoutingProfile::Driving, 1.2)]
    #[case(TransportMode::Train, RoutingProfile::Transit, 1.0)]
    #[case(TransportMode::Bus, RoutingProfile::Transit, 1.0)]
    #[case(TransportMode::Walking, RoutingProfile::Walking, 1.0)]
    #[case(TransportMode::Driving, RoutingProfile::Driving, 1.0)]
    fn factors(#[case] mode: TransportMode, #[case] profile: RoutingProfile, #[case] expected: f64) {
        assert!(close(duration_factor(mode, profile), expected));
    }

    #[test]
    fn bus_duration_scales_but_distance_does_not() {
        let result = normalize(
            route(RoutingProfile::Driving, 2200.0, Vec::new()),
            TransportMode::Bus,
            ProviderName::MAPS_VECTOR,
            None,
            2,
        );

        assert!(close(result.duration_min, 2640.0), "got {}", result.duration_min);
        assert!(close(result.distance_km, 3935.0));
        assert_eq!(result.mode, TransportMode::Bus);
        assert_eq!(result.legs, None);
    }

    #[test]
    fn walking_with_stops_adds_dwell_on_intermediate_legs() {
        let legs = vec![
            ProviderLeg { distance_km: 1.0, duration_min: 12.0 },
            ProviderLeg { distance_km: 2.0, duration_min: 24.0 },
            ProviderLeg { distance_km: 0.5, duration_min: 6.0 },
        ];
        let result = normalize(
            route(RoutingProfile::Walking, 42.0, legs),
            TransportMode::Walking,
            ProviderName::MAPS_VECTOR,
            Some(15),
            4,
        );

        let legs = result.legs.expect("dwell legs");
        let dwell: Vec<f64> = legs.iter().map(|leg| leg.dwell_min).collect();
        assert_eq!(dwell, vec![15.0, 15.0, 0.0]);
        assert_eq!(legs.last().map(|leg| leg.to_index), Some(3));
        assert!(close(result.duration_min, 72.0));
    }

    #[test]
    fn unsplit_routes_are_spread_evenly_across_legs() {
        let result = normalize(
            route(RoutingProfile::Cycling, 30.0, Vec::new()),
            TransportMode::Cycling,
            ProviderName::OPEN_ROUTING_SERVICE,
            Some(10),
            3,
        );

        let legs = result.legs.expect("dwell legs");
        assert_eq!(legs.len(), 2);
        assert!(close(legs[0].travel_min, 15.0));
        assert!(close(result.duration_min, 40.0));
    }

    #[rstest]
    #[case(TransportMode::Walking, None, 4)]
    #[case(TransportMode::Walking, Some(10), 2)]
    #[case(TransportMode::Driving, Some(10), 4)]
    fn dwell_only_for_multi_stop_walks_and_rides(
        #[case] mode: TransportMode,
        #[case] dwell: Option<u32>,
        #[case] waypoints: usize,
    ) {
        let result = normalize(
            route(RoutingProfile::Walking, 30.0, Vec::new()),
            mode,
            ProviderName::MAPS_VECTOR,
            dwell,
            waypoints,
        );
        assert_eq!(result.legs, None);
        assert!(close(result.duration_min, 30.0));
    }
}
