//! Trip: a traveller's intent to visit a destination between two dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, tags::TagSet};

/// Where a trip is in its lifecycle. Only [`TripStatus::Active`] trips take
/// part in discovery.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TripStatus {
  #[default]
  Active,
  Completed,
  Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
  pub trip_id:             Uuid,
  pub owner_id:            Uuid,
  /// Matched by exact, case-sensitive equality during discovery.
  pub destination:         String,
  pub destination_country: String,
  pub start_date:          NaiveDate,
  pub end_date:            NaiveDate,
  pub travel_style:        TagSet,
  pub interests:           TagSet,
  pub status:              TripStatus,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl Trip {
  pub fn is_active(&self) -> bool { self.status == TripStatus::Active }
}

/// The slice of a trip shown as the context of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSummary {
  pub trip_id:     Uuid,
  pub destination: String,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
}

impl From<&Trip> for TripSummary {
  fn from(t: &Trip) -> Self {
    Self {
      trip_id:     t.trip_id,
      destination: t.destination.clone(),
      start_date:  t.start_date,
      end_date:    t.end_date,
    }
  }
}

/// The editable attributes of a trip, used for both creation and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDraft {
  pub destination:         String,
  pub destination_country: String,
  pub start_date:          NaiveDate,
  pub end_date:            NaiveDate,
  #[serde(default)]
  pub travel_style:        TagSet,
  #[serde(default)]
  pub interests:           TagSet,
}

impl TripDraft {
  /// Trim the free-text fields and check the date range. The destination is
  /// otherwise stored exactly as entered.
  pub fn normalized(mut self) -> Result<Self> {
    self.destination = self.destination.trim().to_owned();
    self.destination_country = self.destination_country.trim().to_owned();
    if self.destination.is_empty() {
      return Err(Error::Empty("destination"));
    }
    if self.destination_country.is_empty() {
      return Err(Error::Empty("destination_country"));
    }
    if self.end_date < self.start_date {
      return Err(Error::InvertedDates { start: self.start_date, end: self.end_date });
    }
    Ok(self)
  }
}
