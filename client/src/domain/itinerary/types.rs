//! Trip, POI and vote types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::mutation::{FieldOverlay, Reconcile};
use crate::domain::routing::Coordinate;

/// Validation errors raised by itinerary constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItineraryValidationError {
    /// Days are numbered from one.
    DayNumberZero,
}

impl fmt::Display for ItineraryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayNumberZero => write!(f, "day numbers start at 1"),
        }
    }
}

impl std::error::Error for ItineraryValidationError {}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a trip.
    TripId
);
uuid_id!(
    /// Identifier of a point of interest within a trip.
    PoiId
);

/// One-based day of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct DayNumber(u16);

impl DayNumber {
    /// # Errors
    /// Returns [`ItineraryValidationError::DayNumberZero`] for `0`.
    pub fn new(day: u16) -> Result<Self, ItineraryValidationError> {
        if day == 0 {
            return Err(ItineraryValidationError::DayNumberZero);
        }
        Ok(Self(day))
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for DayNumber {
    type Error = ItineraryValidationError;

    fn try_from(day: u16) -> Result<Self, Self::Error> {
        Self::new(day)
    }
}

impl From<DayNumber> for u16 {
    fn from(day: DayNumber) -> Self {
        day.0
    }
}

impl fmt::Display for DayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The caller's opinion of a POI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    /// Counts towards `likes`.
    Like,
    /// Counts towards `dislikes`.
    Dislike,
}

/// A point of interest as held in the live itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    /// Server identifier.
    pub id: PoiId,
    /// Trip the POI belongs to.
    pub trip_id: TripId,
    /// Display name.
    pub name: String,
    /// Where the POI is.
    pub location: Coordinate,
    /// Day the POI is scheduled on; `None` while unscheduled.
    pub scheduled_day: Option<DayNumber>,
    /// Position within the scheduled day, starting at zero.
    pub day_order: Option<u32>,
    /// Like tally across all travellers.
    pub likes: u32,
    /// Dislike tally across all travellers.
    pub dislikes: u32,
    /// The caller's own vote, if any.
    pub my_vote: Option<Vote>,
}

impl PointOfInterest {
    /// Unscheduled POI with no votes.
    pub fn new(id: PoiId, trip_id: TripId, name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id,
            trip_id,
            name: name.into(),
            location,
            scheduled_day: None,
            day_order: None,
            likes: 0,
            dislikes: 0,
            my_vote: None,
        }
    }

    /// Move the caller's vote from `my_vote` to `next`, adjusting tallies.
    pub fn apply_vote(&mut self, next: Option<Vote>) {
        match self.my_vote {
            Some(Vote::Like) => self.likes = self.likes.saturating_sub(1),
            Some(Vote::Dislike) => self.dislikes = self.dislikes.saturating_sub(1),
            None => {}
        }
        match next {
            Some(Vote::Like) => self.likes = self.likes.saturating_add(1),
            Some(Vote::Dislike) => self.dislikes = self.dislikes.saturating_add(1),
            None => {}
        }
        self.my_vote = next;
    }
}

/// Authoritative fields the server reported for one POI.
///
/// Only the fields present in the response are carried; an explicit `null`
/// (for example `scheduledDay` after unscheduling) is kept and applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiUpdate {
    pub id: PoiId,
    #[serde(flatten)]
    pub fields: FieldOverlay,
}

impl PoiUpdate {
    pub fn new(id: PoiId) -> Self {
        Self {
            id,
            fields: FieldOverlay::new(),
        }
    }

    /// Add a field using the server's camelCase name.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_owned(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Reconcile<PoiId> for PoiUpdate {
    fn authoritative_fields(&self) -> Vec<(PoiId, FieldOverlay)> {
        vec![(self.id, self.fields.clone())]
    }
}
