//! Itinerary scheduling and voting on top of optimistic mutations.
//!
//! Every user-visible change lands in the live collection at once and is
//! confirmed or rolled back when the server answers. Bulk reassignments run
//! as best-effort chains: each POI move stands on its own and the day
//! optimization that follows is attempted even when some moves failed.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::HttpError;
use crate::domain::mutation::{
    ChainReport, ChainStep, LiveCollection, MutationScope, OptimisticCoordinator, run_chain,
};
use crate::domain::ports::ItineraryCommands;
use crate::domain::routing::Coordinate;

mod types;
#[cfg(test)]
mod tests;

pub use types::{
    DayNumber, ItineraryValidationError, PoiId, PoiUpdate, PointOfInterest, TripId, Vote,
};

/// Schedules and votes on the POIs of one trip.
pub struct ItineraryScheduler {
    trip: TripId,
    commands: Arc<dyn ItineraryCommands>,
    coordinator: OptimisticCoordinator<PoiId, PointOfInterest>,
}

impl ItineraryScheduler {
    /// Scheduler for `trip`, mutating `pois` through `commands`.
    pub fn new(
        trip: TripId,
        commands: Arc<dyn ItineraryCommands>,
        pois: LiveCollection<PoiId, PointOfInterest>,
    ) -> Self {
        Self {
            trip,
            commands,
            coordinator: OptimisticCoordinator::new(pois),
        }
    }

    /// Trip being scheduled.
    pub fn trip(&self) -> TripId {
        self.trip
    }

    /// Live POIs; clones observe optimistic updates immediately.
    pub fn pois(&self) -> &LiveCollection<PoiId, PointOfInterest> {
        self.coordinator.collection()
    }

    /// Schedule `poi` at the end of `day`.
    pub async fn schedule(&self, poi: PoiId, day: DayNumber) -> Result<PoiUpdate, HttpError> {
        let order = self.next_order(day, poi);
        self.coordinator
            .apply_optimistic(
                &MutationScope::single(poi),
                |edit| {
                    if let Some(item) = edit.get_mut(&poi) {
                        item.scheduled_day = Some(day);
                        item.day_order = Some(order);
                    }
                },
                self.commands.schedule_poi(self.trip, poi, day),
            )
            .await
    }

    /// Remove `poi` from its day.
    pub async fn unschedule(&self, poi: PoiId) -> Result<PoiUpdate, HttpError> {
        self.coordinator
            .apply_optimistic(
                &MutationScope::single(poi),
                |edit| {
                    if let Some(item) = edit.get_mut(&poi) {
                        item.scheduled_day = None;
                        item.day_order = None;
                    }
                },
                self.commands.unschedule_poi(self.trip, poi),
            )
            .await
    }

    /// Cast `vote` on `poi`. Casting the vote already held retracts it;
    /// casting the other vote moves one count across.
    pub async fn vote(&self, poi: PoiId, vote: Vote) -> Result<PoiUpdate, HttpError> {
        let current = self.pois().get(&poi).and_then(|item| item.my_vote);
        let next = if current == Some(vote) { None } else { Some(vote) };
        debug!(%poi, ?current, ?next, "voting on poi");
        self.coordinator
            .apply_optimistic(
                &MutationScope::single(poi),
                |edit| {
                    if let Some(item) = edit.get_mut(&poi) {
                        item.apply_vote(next);
                    }
                },
                self.commands.vote_poi(self.trip, poi, next),
            )
            .await
    }

    /// Ask the server to reorder `day` and apply the order it returns.
    pub async fn optimize_day(
        &self,
        day: DayNumber,
        start: Option<Coordinate>,
    ) -> Result<Vec<PoiUpdate>, HttpError> {
        let updates = self.commands.optimize_day(self.trip, day, start).await?;
        self.coordinator.reconcile(&updates);
        Ok(updates)
    }

    /// Move `pois` to `day`, then optimize that day.
    pub async fn reassign_day(&self, pois: &[PoiId], day: DayNumber) -> ChainReport {
        let mut steps: Vec<ChainStep<'_>> = pois
            .iter()
            .map(|&poi| {
                ChainStep::new(format!("schedule {poi} on day {day}"), async move {
                    self.schedule(poi, day).await.map(drop)
                })
            })
            .collect();
        steps.push(ChainStep::new(format!("optimize day {day}"), async move {
            self.optimize_day(day, None).await.map(drop)
        }));

        let report = run_chain(steps).await;
        info!(
            trip = %self.trip,
            %day,
            completed = report.completed.len(),
            skipped = report.skipped.len(),
            "day reassignment finished"
        );
        report
    }

    /// Apply several day reassignments; each day is handled independently.
    pub async fn reassign_days(&self, plan: &[(DayNumber, Vec<PoiId>)]) -> ChainReport {
        let mut report = ChainReport::default();
        for (day, pois) in plan {
            report.absorb(self.reassign_day(pois, *day).await);
        }
        report
    }

    fn next_order(&self, day: DayNumber, moving: PoiId) -> u32 {
        self.pois()
            .values()
            .iter()
            .filter(|item| item.id != moving && item.scheduled_day == Some(day))
            .filter_map(|item| item.day_order)
            .max()
            .map_or(0, |order| order.saturating_add(1))
    }
}
