//! Resilient request orchestration for the itinerary client.
//!
//! The [`domain`] layer owns the request execution engine, route resolution
//! across routing providers and optimistic mutations of shared itinerary
//! state. [`outbound`] adapters connect it to real HTTP services, and
//! [`config`] wires both from layered settings.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ClientSettings, ConfigError};
pub use domain::{HttpError, HttpErrorKind};
