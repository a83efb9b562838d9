//! Accounts and sessions, the identity gate's records.
//!
//! An account shares its UUID with the [`Profile`](crate::profile::Profile)
//! created alongside it at sign-up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  profile::{validate_age, validate_name},
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Photo stored for profiles that sign up without one.
pub const DEFAULT_PHOTO_URL: &str =
  "https://images.unsplash.com/photo-1535713875002-d1d0cf377fde?w=400&h=400&fit=crop";

/// Login credentials for one user.
#[derive(Debug, Clone)]
pub struct Account {
  pub user_id:       Uuid,
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Input to [`crate::store::TravelStore::create_account`]. The password is
/// already hashed; validation of the raw password happens before hashing.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub password_hash: String,
  pub name:          String,
  pub age:           u32,
  pub bio:           Option<String>,
  pub photo_url:     Option<String>,
}

impl NewAccount {
  /// Validate and normalise the profile seed fields. A missing photo falls
  /// back to [`DEFAULT_PHOTO_URL`].
  pub fn normalized(mut self) -> Result<Self> {
    self.email = normalize_email(&self.email)?;
    self.name = validate_name(&self.name)?;
    validate_age(self.age)?;
    self.bio = self.bio.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
    self.photo_url = Some(
      self
        .photo_url
        .map(|p| p.trim().to_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PHOTO_URL.to_owned()),
    );
    Ok(self)
  }
}

/// A bearer session. Only the digest of the token is ever stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}

/// Trim and lowercase an email address, rejecting anything without a local
/// part and a domain.
pub fn normalize_email(email: &str) -> Result<String> {
  let email = email.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
    _ => Err(Error::InvalidEmail(email)),
  }
}

pub fn validate_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::PasswordTooShort);
  }
  Ok(())
}
