//! Driven port for itinerary mutations confirmed by the remote API.

use async_trait::async_trait;

use crate::domain::HttpError;
use crate::domain::itinerary::{DayNumber, PoiId, PoiUpdate, TripId, Vote};
use crate::domain::routing::Coordinate;

/// Remote commands behind scheduling and voting.
///
/// Every call goes through the request execution engine; implementations must
/// not touch local state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryCommands: Send + Sync {
    /// Assign a POI to a day.
    async fn schedule_poi(
        &self,
        trip: TripId,
        poi: PoiId,
        day: DayNumber,
    ) -> Result<PoiUpdate, HttpError>;

    /// Remove a POI from the schedule.
    async fn unschedule_poi(&self, trip: TripId, poi: PoiId) -> Result<PoiUpdate, HttpError>;

    /// Record (or retract, when `vote` is `None`) the caller's vote on a POI.
    async fn vote_poi(
        &self,
        trip: TripId,
        poi: PoiId,
        vote: Option<Vote>,
    ) -> Result<PoiUpdate, HttpError>;

    /// Ask the server to reorder a day's POIs, optionally starting from
    /// `start`; returns the authoritative order.
    async fn optimize_day(
        &self,
        trip: TripId,
        day: DayNumber,
        start: Option<Coordinate>,
    ) -> Result<Vec<PoiUpdate>, HttpError>;
}
