//! Optimistic itinerary mutations against a scripted trip API.

use std::sync::Arc;

use itinerary_client::domain::HttpErrorKind;
use itinerary_client::domain::itinerary::{
    DayNumber, ItineraryScheduler, PoiId, PointOfInterest, TripId, Vote,
};
use itinerary_client::domain::mutation::LiveCollection;
use itinerary_client::domain::request::RequestExecutor;
use itinerary_client::domain::routing::Coordinate;
use itinerary_client::outbound::itinerary::HttpItineraryCommands;
use itinerary_client::test_support::{ScriptedReply, ScriptedTransport, immediate_runtime};
use rstest::{fixture, rstest};
use serde_json::json;

struct Trip {
    scheduler: ItineraryScheduler,
    transport: Arc<ScriptedTransport>,
    louvre: PoiId,
    orsay: PoiId,
}

fn day(number: u16) -> DayNumber {
    DayNumber::new(number).expect("valid day")
}

fn trip_with(script: impl FnOnce(PoiId, PoiId) -> Vec<ScriptedReply>) -> Trip {
    let trip = TripId::random();
    let (louvre, orsay) = (PoiId::random(), PoiId::random());
    let pois = LiveCollection::from_items([
        (
            louvre,
            PointOfInterest::new(louvre, trip, "Louvre", Coordinate::new(48.8606, 2.3376)),
        ),
        (
            orsay,
            PointOfInterest::new(orsay, trip, "Musée d'Orsay", Coordinate::new(48.86, 2.3266)),
        ),
    ]);
    let transport = Arc::new(ScriptedTransport::new(script(louvre, orsay)));
    let executor = RequestExecutor::new(transport.clone(), "https://trips.example.test/api/v1")
        .with_runtime(immediate_runtime());
    let commands = HttpItineraryCommands::new(Arc::new(executor));
    Trip {
        scheduler: ItineraryScheduler::new(trip, Arc::new(commands), pois),
        transport,
        louvre,
        orsay,
    }
}

#[fixture]
fn rejected_trip() -> Trip {
    trip_with(|_, _| {
        vec![ScriptedReply::json(
            422,
            &json!({ "message": "day is outside the trip" }),
        )]
    })
}

#[rstest]
#[tokio::test]
async fn rejected_schedule_restores_the_previous_state(rejected_trip: Trip) {
    let before = rejected_trip.scheduler.pois().items();

    let error = rejected_trip
        .scheduler
        .schedule(rejected_trip.louvre, day(9))
        .await
        .expect_err("server rejects");

    assert_eq!(error.kind(), HttpErrorKind::Client);
    assert_eq!(error.message(), "day is outside the trip");
    assert_eq!(rejected_trip.scheduler.pois().items(), before);
    assert_eq!(rejected_trip.transport.calls(), 1);
}

#[tokio::test]
async fn confirmed_vote_takes_server_tallies() {
    let trip = trip_with(|louvre, _| {
        vec![ScriptedReply::json(
            200,
            &json!({ "id": louvre, "likes": 7, "dislikes": 1, "myVote": "like" }),
        )]
    });

    trip.scheduler
        .vote(trip.louvre, Vote::Like)
        .await
        .expect("vote lands");

    let poi = trip.scheduler.pois().get(&trip.louvre).expect("poi");
    assert_eq!((poi.likes, poi.dislikes), (7, 1));
    assert_eq!(poi.my_vote, Some(Vote::Like));
}

#[tokio::test]
async fn reassignment_survives_a_failed_move() {
    let trip = trip_with(|louvre, _| {
        vec![
            ScriptedReply::json(
                200,
                &json!({ "id": louvre, "scheduledDay": 2, "dayOrder": 5 }),
            ),
            ScriptedReply::json(409, &json!({ "detail": "poi is locked" })),
            ScriptedReply::json(200, &json!([{ "id": louvre, "dayOrder": 0 }])),
        ]
    });

    let report = trip
        .scheduler
        .reassign_day(&[trip.louvre, trip.orsay], day(2))
        .await;

    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(
        report.skipped[0].label,
        format!("schedule {} on day 2", trip.orsay)
    );
    assert_eq!(report.skipped[0].error.status(), 409);

    let louvre = trip.scheduler.pois().get(&trip.louvre).expect("louvre");
    assert_eq!(louvre.scheduled_day, Some(day(2)));
    assert_eq!(louvre.day_order, Some(0));
    let orsay = trip.scheduler.pois().get(&trip.orsay).expect("orsay");
    assert_eq!(orsay.scheduled_day, None);
    assert_eq!(trip.transport.calls(), 3);
}
