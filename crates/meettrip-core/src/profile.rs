//! Profile: a traveller's public identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, tags::TagSet};

pub const MIN_AGE: u32 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub profile_id: Uuid,
  pub name:       String,
  pub age:        u32,
  pub bio:        Option<String>,
  pub photo_url:  Option<String>,
  pub languages:  TagSet,
  pub interests:  TagSet,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The slice of a profile shown next to a match or a message thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
  pub profile_id: Uuid,
  pub name:       String,
  pub photo_url:  Option<String>,
}

impl From<&Profile> for ProfileSummary {
  fn from(p: &Profile) -> Self {
    Self {
      profile_id: p.profile_id,
      name:       p.name.clone(),
      photo_url:  p.photo_url.clone(),
    }
  }
}

/// Full replacement of the editable profile attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub name:      String,
  pub age:       u32,
  #[serde(default)]
  pub bio:       Option<String>,
  #[serde(default)]
  pub photo_url: Option<String>,
  #[serde(default)]
  pub languages: TagSet,
  #[serde(default)]
  pub interests: TagSet,
}

impl ProfileUpdate {
  pub fn normalized(mut self) -> Result<Self> {
    self.name = validate_name(&self.name)?;
    validate_age(self.age)?;
    self.bio = self.bio.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
    self.photo_url = self
      .photo_url
      .map(|p| p.trim().to_owned())
      .filter(|p| !p.is_empty());
    Ok(self)
  }
}

pub fn validate_age(age: u32) -> Result<()> {
  if age < MIN_AGE {
    return Err(Error::Underage(age));
  }
  Ok(())
}

/// Returns the trimmed name, or an error if nothing is left.
pub fn validate_name(name: &str) -> Result<String> {
  let name = name.trim();
  if name.is_empty() {
    return Err(Error::Empty("name"));
  }
  Ok(name.to_owned())
}
