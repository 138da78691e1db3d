//! Routing provider adapters.
//!
//! Both adapters implement the `RouteProvider` port on top of the request
//! execution engine, so provider calls share its retry, timeout and
//! cancellation behaviour.

mod dto;
mod maps_vector;
mod open_routing;

pub use maps_vector::VectorMapsRouteProvider;
pub use open_routing::OpenRouteServiceProvider;
use url::Url;

use crate::domain::HttpError;
use crate::domain::request::RequestOptions;
use crate::domain::routing::Coordinate;

/// Join `path` under `base`, keeping any path prefix the base carries.
fn endpoint(base: &Url, path: &str) -> Result<Url, HttpError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path).map_err(|error| {
        HttpError::network(format!("invalid provider url for `{path}`: {error}")).with_cause(error)
    })
}

/// `lon,lat;lon,lat;...` as used in directions paths.
fn coordinate_path(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|point| format!("{},{}", point.lon, point.lat))
        .collect::<Vec<_>>()
        .join(";")
}

fn provider_options(request_id: Option<String>) -> RequestOptions {
    RequestOptions {
        request_id,
        ..RequestOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("https://api.example.test", "v2/health", "https://api.example.test/v2/health")]
    #[case("https://api.example.test/ors", "v2/health", "https://api.example.test/ors/v2/health")]
    #[case("https://api.example.test/ors/", "v2/health", "https://api.example.test/ors/v2/health")]
    fn endpoints_keep_base_prefix(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        let base = Url::parse(base).expect("valid base");
        assert_eq!(endpoint(&base, path).expect("joins").as_str(), expected);
    }

    #[test]
    fn coordinate_paths_are_lon_lat() {
        let path = coordinate_path(&[Coordinate::new(51.5, -0.12), Coordinate::new(48.85, 2.35)]);
        assert_eq!(path, "-0.12,51.5;2.35,48.85");
    }
}
