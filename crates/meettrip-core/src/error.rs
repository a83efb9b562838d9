//! Error types for `meettrip-core`.
//!
//! Every variant is an input validation failure; storage failures live in
//! the backend crates.

use chrono::NaiveDate;
use thiserror::Error;

use crate::{account::MIN_PASSWORD_LEN, profile::MIN_AGE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("{0} must not be empty")]
  Empty(&'static str),

  #[error("travellers must be at least {MIN_AGE} years old (got {0})")]
  Underage(u32),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
  PasswordTooShort,

  #[error("trip ends on {end} before it starts on {start}")]
  InvertedDates { start: NaiveDate, end: NaiveDate },

  #[error("cannot swipe on yourself")]
  SelfSwipe,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
