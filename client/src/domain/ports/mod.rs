//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod http_transport;
mod itinerary_commands;
mod route_provider;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{
    HttpTransport, TransportBody, TransportError, TransportRequest, TransportResponse,
};
#[cfg(test)]
pub use itinerary_commands::MockItineraryCommands;
pub use itinerary_commands::ItineraryCommands;
#[cfg(test)]
pub use route_provider::MockRouteProvider;
pub use route_provider::RouteProvider;
