//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`. Tag sets are stored as compact JSON arrays. UUIDs are stored
//! as hyphenated lowercase strings, which sort the same way as [`Uuid`]
//! itself; the `user1_id < user2_id` check on `matches` relies on that.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use meettrip_core::{
  account::Account,
  matching::{Match, Swipe, SwipeAction},
  message::Message,
  profile::Profile,
  tags::TagSet,
  trip::{Trip, TripStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &TagSet) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<TagSet> { Ok(serde_json::from_str(s)?) }

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_variant<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::UnknownVariant { kind, value: s.to_owned() })
}

pub fn decode_status(s: &str) -> Result<TripStatus> { decode_variant("trip status", s) }

pub fn decode_action(s: &str) -> Result<SwipeAction> { decode_variant("swipe action", s) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PROFILE_COLUMNS: &str =
  "profile_id, name, age, bio, photo_url, languages, interests, created_at, updated_at";

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub profile_id: String,
  pub name:       String,
  pub age:        u32,
  pub bio:        Option<String>,
  pub photo_url:  Option<String>,
  pub languages:  String,
  pub interests:  String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawProfile {
  /// Map a row selected with [`PROFILE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id: row.get(0)?,
      name:       row.get(1)?,
      age:        row.get(2)?,
      bio:        row.get(3)?,
      photo_url:  row.get(4)?,
      languages:  row.get(5)?,
      interests:  row.get(6)?,
      created_at: row.get(7)?,
      updated_at: row.get(8)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      profile_id: decode_uuid(&self.profile_id)?,
      name:       self.name,
      age:        self.age,
      bio:        self.bio,
      photo_url:  self.photo_url,
      languages:  decode_tags(&self.languages)?,
      interests:  decode_tags(&self.interests)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from the credential columns of a `profiles` row.
pub struct RawAccount {
  pub profile_id:    String,
  pub email:         String,
  pub password_hash: String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      user_id:       decode_uuid(&self.profile_id)?,
      email:         self.email,
      password_hash: self.password_hash,
    })
  }
}

pub const TRIP_COLUMNS: &str = "trip_id, owner_id, destination, destination_country, \
   start_date, end_date, travel_style, interests, status, created_at, updated_at";

/// Raw strings read directly from a `trips` row.
pub struct RawTrip {
  pub trip_id:             String,
  pub owner_id:            String,
  pub destination:         String,
  pub destination_country: String,
  pub start_date:          String,
  pub end_date:            String,
  pub travel_style:        String,
  pub interests:           String,
  pub status:              String,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawTrip {
  /// Map a row selected with [`TRIP_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      trip_id:             row.get(0)?,
      owner_id:            row.get(1)?,
      destination:         row.get(2)?,
      destination_country: row.get(3)?,
      start_date:          row.get(4)?,
      end_date:            row.get(5)?,
      travel_style:        row.get(6)?,
      interests:           row.get(7)?,
      status:              row.get(8)?,
      created_at:          row.get(9)?,
      updated_at:          row.get(10)?,
    })
  }

  pub fn into_trip(self) -> Result<Trip> {
    Ok(Trip {
      trip_id:             decode_uuid(&self.trip_id)?,
      owner_id:            decode_uuid(&self.owner_id)?,
      destination:         self.destination,
      destination_country: self.destination_country,
      start_date:          decode_date(&self.start_date)?,
      end_date:            decode_date(&self.end_date)?,
      travel_style:        decode_tags(&self.travel_style)?,
      interests:           decode_tags(&self.interests)?,
      status:              decode_status(&self.status)?,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

pub const SWIPE_COLUMNS: &str = "swipe_id, actor_id, target_id, trip_id, action, created_at";

/// Raw strings read directly from a `swipes` row.
pub struct RawSwipe {
  pub swipe_id:   String,
  pub actor_id:   String,
  pub target_id:  String,
  pub trip_id:    String,
  pub action:     String,
  pub created_at: String,
}

impl RawSwipe {
  /// Map a row selected with [`SWIPE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      swipe_id:   row.get(0)?,
      actor_id:   row.get(1)?,
      target_id:  row.get(2)?,
      trip_id:    row.get(3)?,
      action:     row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_swipe(self) -> Result<Swipe> {
    Ok(Swipe {
      swipe_id:   decode_uuid(&self.swipe_id)?,
      actor_id:   decode_uuid(&self.actor_id)?,
      target_id:  decode_uuid(&self.target_id)?,
      trip_id:    decode_uuid(&self.trip_id)?,
      action:     decode_action(&self.action)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const MATCH_COLUMNS: &str = "match_id, user1_id, user2_id, trip_id, created_at";

/// Raw strings read directly from a `matches` row.
pub struct RawMatch {
  pub match_id:   String,
  pub user1_id:   String,
  pub user2_id:   String,
  pub trip_id:    String,
  pub created_at: String,
}

impl RawMatch {
  /// Map a row selected with [`MATCH_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_id:   row.get(0)?,
      user1_id:   row.get(1)?,
      user2_id:   row.get(2)?,
      trip_id:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_match(self) -> Result<Match> {
    Ok(Match {
      match_id:   decode_uuid(&self.match_id)?,
      user1_id:   decode_uuid(&self.user1_id)?,
      user2_id:   decode_uuid(&self.user2_id)?,
      trip_id:    decode_uuid(&self.trip_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str =
  "message_id, match_id, sender_id, seq, content, read, created_at";

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub message_id: String,
  pub match_id:   String,
  pub sender_id:  String,
  pub seq:        i64,
  pub content:    String,
  pub read:       bool,
  pub created_at: String,
}

impl RawMessage {
  /// Map a row selected with [`MESSAGE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      match_id:   row.get(1)?,
      sender_id:  row.get(2)?,
      seq:        row.get(3)?,
      content:    row.get(4)?,
      read:       row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id: decode_uuid(&self.message_id)?,
      match_id:   decode_uuid(&self.match_id)?,
      sender_id:  decode_uuid(&self.sender_id)?,
      seq:        self.seq,
      content:    self.content,
      read:       self.read,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
