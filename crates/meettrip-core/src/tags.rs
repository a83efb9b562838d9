//! [`TagSet`], the multi-select attribute type shared by profiles and trips
//! (languages, interests, travel styles).
//!
//! Membership is exact string equality. There is no vocabulary check; the
//! recognised lists in [`crate::vocabulary`] are advisory.

use serde::{Deserialize, Serialize};

/// An insertion-ordered, duplicate-free set of free-text tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
  pub fn new() -> Self { Self::default() }

  pub fn contains(&self, tag: &str) -> bool { self.0.iter().any(|t| t == tag) }

  /// Add `tag` if absent. Blank tags are ignored. Returns `true` if the set
  /// changed.
  pub fn insert(&mut self, tag: impl Into<String>) -> bool {
    let tag = tag.into();
    let tag = tag.trim();
    if tag.is_empty() || self.contains(tag) {
      return false;
    }
    self.0.push(tag.to_owned());
    true
  }

  /// Flip membership of `tag`, compared after trimming. Returns `true` if it
  /// is now a member.
  pub fn toggle(&mut self, tag: &str) -> bool {
    let tag = tag.trim();
    if let Some(pos) = self.0.iter().position(|t| t == tag) {
      self.0.remove(pos);
      false
    } else {
      self.insert(tag)
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn as_slice(&self) -> &[String] { &self.0 }
}

impl From<Vec<String>> for TagSet {
  fn from(tags: Vec<String>) -> Self { tags.into_iter().collect() }
}

impl From<TagSet> for Vec<String> {
  fn from(set: TagSet) -> Self { set.0 }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut set = TagSet::new();
    for tag in iter {
      set.insert(tag);
    }
    set
  }
}
