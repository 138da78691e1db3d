//! Scheduling, voting and bulk reassignment against a mocked command port.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::MockItineraryCommands;

struct Trip {
    id: TripId,
    museum: PoiId,
    harbour: PoiId,
    market: PoiId,
    pois: LiveCollection<PoiId, PointOfInterest>,
}

fn day(n: u16) -> DayNumber {
    DayNumber::new(n).expect("valid day")
}

#[fixture]
fn trip() -> Trip {
    let id = TripId::random();
    let museum = PoiId::random();
    let harbour = PoiId::random();
    let market = PoiId::random();

    let mut scheduled = PointOfInterest::new(museum, id, "Museum", Coordinate::new(59.91, 10.75));
    scheduled.scheduled_day = Some(day(1));
    scheduled.day_order = Some(0);
    scheduled.likes = 2;
    let harbour_poi = PointOfInterest::new(harbour, id, "Harbour", Coordinate::new(59.90, 10.73));
    let mut market_poi = PointOfInterest::new(market, id, "Market", Coordinate::new(59.92, 10.76));
    market_poi.dislikes = 1;
    market_poi.my_vote = Some(Vote::Dislike);

    Trip {
        id,
        museum,
        harbour,
        market,
        pois: LiveCollection::from_items([
            (museum, scheduled),
            (harbour, harbour_poi),
            (market, market_poi),
        ]),
    }
}

fn scheduler(trip: &Trip, commands: MockItineraryCommands) -> ItineraryScheduler {
    ItineraryScheduler::new(trip.id, Arc::new(commands), trip.pois.clone())
}

#[rstest]
fn day_numbers_start_at_one() {
    assert_eq!(DayNumber::new(0), Err(ItineraryValidationError::DayNumberZero));
    assert!(serde_json::from_value::<DayNumber>(json!(0)).is_err());
    assert_eq!(
        serde_json::from_value::<DayNumber>(json!(3)).ok().map(DayNumber::get),
        Some(3)
    );
}

#[rstest]
fn poi_update_keeps_explicit_nulls() {
    let id = PoiId::random();
    let update: PoiUpdate =
        serde_json::from_value(json!({ "id": id, "scheduledDay": null, "likes": 4 }))
            .expect("decodes");

    assert_eq!(update.id, id);
    assert_eq!(update.field("scheduledDay"), Some(&json!(null)));
    assert_eq!(update.field("likes"), Some(&json!(4)));
    assert_eq!(update.field("id"), None);
}

#[rstest]
#[tokio::test]
async fn schedule_appends_to_day_and_takes_server_order(trip: Trip) {
    let harbour = trip.harbour;
    let mut commands = MockItineraryCommands::new();
    commands
        .expect_schedule_poi()
        .withf(move |_, poi, target| *poi == harbour && target.get() == 1)
        .times(1)
        .returning(|_, poi, _| Ok(PoiUpdate::new(poi).with_field("dayOrder", json!(0))));
    let scheduler = scheduler(&trip, commands);

    scheduler.schedule(harbour, day(1)).await.expect("scheduled");

    let poi = trip.pois.get(&harbour).expect("present");
    assert_eq!(poi.scheduled_day, Some(day(1)));
    assert_eq!(poi.day_order, Some(0), "server order replaces optimistic slot 1");
}

#[rstest]
#[tokio::test]
async fn failed_schedule_rolls_back(trip: Trip) {
    let before = trip.pois.items();
    let mut commands = MockItineraryCommands::new();
    commands
        .expect_schedule_poi()
        .returning(|_, _, _| Err(HttpError::from_status(409, Some(json!({ "error": "day full" })))));
    let scheduler = scheduler(&trip, commands);

    let error = scheduler
        .schedule(trip.harbour, day(1))
        .await
        .expect_err("conflict");

    assert_eq!(error.message(), "day full");
    assert_eq!(trip.pois.items(), before);
}

#[rstest]
#[tokio::test]
async fn unschedule_applies_server_null(trip: Trip) {
    let mut commands = MockItineraryCommands::new();
    commands.expect_unschedule_poi().returning(|_, poi| {
        Ok(PoiUpdate::new(poi)
            .with_field("scheduledDay", json!(null))
            .with_field("dayOrder", json!(null)))
    });
    let scheduler = scheduler(&trip, commands);

    scheduler.unschedule(trip.museum).await.expect("unscheduled");

    let poi = trip.pois.get(&trip.museum).expect("present");
    assert_eq!(poi.scheduled_day, None);
    assert_eq!(poi.day_order, None);
}

#[rstest]
#[case::first_like(Vote::Like, Some(Vote::Like), 3, 0)]
#[case::first_dislike(Vote::Dislike, Some(Vote::Dislike), 2, 1)]
#[tokio::test]
async fn voting_updates_tallies_immediately(
    trip: Trip,
    #[case] cast: Vote,
    #[case] sent: Option<Vote>,
    #[case] likes: u32,
    #[case] dislikes: u32,
) {
    let mut commands = MockItineraryCommands::new();
    commands
        .expect_vote_poi()
        .withf(move |_, _, vote| *vote == sent)
        .times(1)
        .returning(|_, poi, _| Ok(PoiUpdate::new(poi)));
    let scheduler = scheduler(&trip, commands);

    scheduler.vote(trip.museum, cast).await.expect("voted");

    let poi = trip.pois.get(&trip.museum).expect("present");
    assert_eq!((poi.likes, poi.dislikes, poi.my_vote), (likes, dislikes, sent));
}

#[rstest]
#[tokio::test]
async fn repeating_a_vote_retracts_it_and_switching_moves_it(trip: Trip) {
    let mut commands = MockItineraryCommands::new();
    let mut sequence = mockall::Sequence::new();
    commands
        .expect_vote_poi()
        .withf(|_, _, vote| vote.is_none())
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, poi, _| Ok(PoiUpdate::new(poi)));
    commands
        .expect_vote_poi()
        .withf(|_, _, vote| *vote == Some(Vote::Like))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, poi, _| {
            Ok(PoiUpdate::new(poi)
                .with_field("likes", json!(7))
                .with_field("dislikes", json!(0)))
        });
    let scheduler = scheduler(&trip, commands);

    scheduler.vote(trip.market, Vote::Dislike).await.expect("retracted");
    let poi = trip.pois.get(&trip.market).expect("present");
    assert_eq!((poi.likes, poi.dislikes, poi.my_vote), (0, 0, None));

    scheduler.vote(trip.market, Vote::Like).await.expect("liked");
    let poi = trip.pois.get(&trip.market).expect("present");
    assert_eq!(poi.likes, 7, "server tally wins");
    assert_eq!(poi.my_vote, Some(Vote::Like));
}

#[rstest]
#[tokio::test]
async fn failed_vote_restores_tallies(trip: Trip) {
    let before = trip.pois.get(&trip.market);
    let mut commands = MockItineraryCommands::new();
    commands
        .expect_vote_poi()
        .returning(|_, _, _| Err(HttpError::network("offline")));
    let scheduler = scheduler(&trip, commands);

    assert!(scheduler.vote(trip.market, Vote::Like).await.is_err());
    assert_eq!(trip.pois.get(&trip.market), before);
}

#[rstest]
#[tokio::test]
async fn reassign_day_skips_failed_moves_and_still_optimizes(trip: Trip) {
    let (harbour, market) = (trip.harbour, trip.market);
    let mut commands = MockItineraryCommands::new();
    commands.expect_schedule_poi().returning(move |_, poi, _| {
        if poi == market {
            Err(HttpError::from_status(503, None))
        } else {
            Ok(PoiUpdate::new(poi))
        }
    });
    commands
        .expect_optimize_day()
        .withf(|_, target, start| target.get() == 2 && start.is_none())
        .times(1)
        .returning(move |_, _, _| Ok(vec![PoiUpdate::new(harbour).with_field("dayOrder", json!(0))]));
    let scheduler = scheduler(&trip, commands);

    let report = scheduler.reassign_day(&[harbour, market], day(2)).await;

    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].label, format!("schedule {market} on day 2"));
    assert_eq!(trip.pois.get(&harbour).and_then(|poi| poi.scheduled_day), Some(day(2)));
    assert_eq!(trip.pois.get(&market).and_then(|poi| poi.scheduled_day), None);
}

#[rstest]
#[tokio::test]
async fn each_day_is_optimized_independently(trip: Trip) {
    let mut commands = MockItineraryCommands::new();
    commands
        .expect_schedule_poi()
        .returning(|_, poi, _| Ok(PoiUpdate::new(poi)));
    commands.expect_optimize_day().returning(|_, target, _| {
        if target.get() == 2 {
            Err(HttpError::timeout(std::time::Duration::from_secs(30)))
        } else {
            Ok(Vec::new())
        }
    });
    let scheduler = scheduler(&trip, commands);

    let report = scheduler
        .reassign_days(&[(day(2), vec![trip.harbour]), (day(3), vec![trip.market])])
        .await;

    assert_eq!(report.completed.len(), 3);
    assert_eq!(
        report
            .skipped
            .iter()
            .map(|step| step.label.as_str())
            .collect::<Vec<_>>(),
        vec!["optimize day 2"]
    );
    assert_eq!(trip.pois.get(&trip.market).and_then(|poi| poi.scheduled_day), Some(day(3)));
}
