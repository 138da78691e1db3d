//! HTTP implementation of the `ItineraryCommands` port.
//!
//! Thin translation between command arguments and the trip API; every call
//! goes through the request execution engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::HttpError;
use crate::domain::itinerary::{DayNumber, PoiId, PoiUpdate, TripId, Vote};
use crate::domain::ports::ItineraryCommands;
use crate::domain::request::{ParsedBody, RequestBody, RequestExecutor, RequestOptions};
use crate::domain::routing::Coordinate;

/// Trip API client for scheduling, voting and day optimization.
pub struct HttpItineraryCommands {
    executor: Arc<RequestExecutor>,
}

impl HttpItineraryCommands {
    /// Commands sent through `executor`, whose base URL points at the trip API.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    async fn patch_poi(&self, trip: TripId, poi: PoiId, fields: Value) -> Result<PoiUpdate, HttpError> {
        let body = self
            .executor
            .patch(
                &format!("/trips/{trip}/pois/{poi}"),
                RequestBody::Json(fields),
                RequestOptions::default(),
            )
            .await?;
        poi_update(poi, &body)
    }
}

/// Servers may answer with the updated POI or with no content.
fn poi_update(poi: PoiId, body: &ParsedBody) -> Result<PoiUpdate, HttpError> {
    match body {
        ParsedBody::Empty => Ok(PoiUpdate::new(poi)),
        other => other.json(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptimizedDayDto {
    Bare(Vec<PoiUpdate>),
    Wrapped { pois: Vec<PoiUpdate> },
}

#[async_trait]
impl ItineraryCommands for HttpItineraryCommands {
    async fn schedule_poi(
        &self,
        trip: TripId,
        poi: PoiId,
        day: DayNumber,
    ) -> Result<PoiUpdate, HttpError> {
        self.patch_poi(trip, poi, json!({ "scheduledDay": day })).await
    }

    async fn unschedule_poi(&self, trip: TripId, poi: PoiId) -> Result<PoiUpdate, HttpError> {
        self.patch_poi(trip, poi, json!({ "scheduledDay": null, "dayOrder": null }))
            .await
    }

    async fn vote_poi(
        &self,
        trip: TripId,
        poi: PoiId,
        vote: Option<Vote>,
    ) -> Result<PoiUpdate, HttpError> {
        let body = self
            .executor
            .post(
                &format!("/trips/{trip}/pois/{poi}/vote"),
                RequestBody::Json(json!({ "vote": vote })),
                RequestOptions::default(),
            )
            .await?;
        poi_update(poi, &body)
    }

    async fn optimize_day(
        &self,
        trip: TripId,
        day: DayNumber,
        start: Option<Coordinate>,
    ) -> Result<Vec<PoiUpdate>, HttpError> {
        let payload = match start {
            Some(start) => json!({ "start": start }),
            None => json!({}),
        };
        let body = self
            .executor
            .post(
                &format!("/trips/{trip}/days/{day}/optimize"),
                RequestBody::Json(payload),
                RequestOptions::default(),
            )
            .await?;
        if body == ParsedBody::Empty {
            return Ok(Vec::new());
        }
        Ok(match body.json::<OptimizedDayDto>()? {
            OptimizedDayDto::Bare(updates) | OptimizedDayDto::Wrapped { pois: updates } => updates,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::ports::{TransportBody, TransportRequest};
    use crate::domain::request::HttpMethod;
    use crate::test_support::{ScriptedReply, ScriptedTransport, immediate_runtime};

    const BASE: &str = "https://trips.example.test/api/v1";

    fn commands(transport: Arc<ScriptedTransport>) -> HttpItineraryCommands {
        HttpItineraryCommands::new(Arc::new(
            RequestExecutor::new(transport, BASE).with_runtime(immediate_runtime()),
        ))
    }

    fn sent_json(request: &TransportRequest) -> Value {
        let TransportBody::Bytes(bytes) = &request.body else {
            panic!("json body expected");
        };
        serde_json::from_slice(bytes).expect("json body")
    }

    #[tokio::test]
    async fn schedule_patches_the_poi_and_decodes_the_update() {
        let (trip, poi) = (TripId::random(), PoiId::random());
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedReply::json(
            200,
            &json!({ "id": poi, "scheduledDay": 2, "dayOrder": 4 }),
        )]));
        let day = DayNumber::new(2).expect("valid day");

        let update = commands(transport.clone())
            .schedule_poi(trip, poi, day)
            .await
            .expect("scheduled");

        assert_eq!(update.field("dayOrder"), Some(&json!(4)));
        let request = &transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.url, format!("{BASE}/trips/{trip}/pois/{poi}"));
        assert_eq!(sent_json(request), json!({ "scheduledDay": 2 }));
    }

    #[tokio::test]
    async fn retracted_vote_is_sent_as_null_and_no_content_is_accepted() {
        let (trip, poi) = (TripId::random(), PoiId::random());
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedReply::status(204)]));

        let update = commands(transport.clone())
            .vote_poi(trip, poi, None)
            .await
            .expect("voted");

        assert_eq!(update, PoiUpdate::new(poi));
        let request = &transport.requests()[0];
        assert_eq!(request.url, format!("{BASE}/trips/{trip}/pois/{poi}/vote"));
        assert_eq!(sent_json(request), json!({ "vote": null }));
    }

    #[tokio::test]
    async fn optimize_accepts_bare_and_wrapped_lists() {
        let trip = TripId::random();
        let (first, second) = (PoiId::random(), PoiId::random());
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedReply::json(200, &json!([{ "id": first, "dayOrder": 0 }])),
            ScriptedReply::json(200, &json!({ "pois": [{ "id": second, "dayOrder": 1 }] })),
        ]));
        let commands = commands(transport.clone());
        let day = DayNumber::new(3).expect("valid day");

        let bare = commands
            .optimize_day(trip, day, Some(Coordinate::new(45.0, 7.0)))
            .await
            .expect("bare");
        let wrapped = commands.optimize_day(trip, day, None).await.expect("wrapped");

        assert_eq!(bare[0].id, first);
        assert_eq!(wrapped[0].id, second);
        let requests = transport.requests();
        assert_eq!(requests[0].url, format!("{BASE}/trips/{trip}/days/3/optimize"));
        assert_eq!(
            sent_json(&requests[0]),
            json!({ "start": { "lat": 45.0, "lon": 7.0 } })
        );
        assert_eq!(sent_json(&requests[1]), json!({}));
    }

    #[tokio::test]
    async fn server_errors_surface_after_retries() {
        let transport = Arc::new(ScriptedTransport::repeating(ScriptedReply::json(
            503,
            &json!({ "detail": "maintenance" }),
        )));

        let error = commands(transport.clone())
            .unschedule_poi(TripId::random(), PoiId::random())
            .await
            .expect_err("fails");

        assert_eq!(error.message(), "maintenance");
        assert_eq!(transport.calls(), 4);
    }
}
