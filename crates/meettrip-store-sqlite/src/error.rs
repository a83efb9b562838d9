//! Error type for `meettrip-store-sqlite`.

use meettrip_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {kind} in database: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  #[error("user {actor} already swiped on user {target} for trip {trip}")]
  DuplicateSwipe {
    actor:  uuid::Uuid,
    target: uuid::Uuid,
    trip:   uuid::Uuid,
  },
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool {
    matches!(self, Error::DuplicateEmail(_) | Error::DuplicateSwipe { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
