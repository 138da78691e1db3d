//! Outbound adapters implementing domain ports for external services.
//!
//! - **http**: reqwest-backed `HttpTransport`
//! - **routing**: vector maps and open routing service `RouteProvider`s
//! - **itinerary**: trip API `ItineraryCommands`
//!
//! Adapters translate between domain types and wire formats. Retry, timeout
//! and cancellation behaviour stays in the domain request engine.

pub mod http;
pub mod itinerary;
pub mod routing;
