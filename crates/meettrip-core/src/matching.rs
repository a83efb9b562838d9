//! Swipes, matches, and the rule that turns two likes into one match.
//!
//! A swipe is an immutable directional preference. A match exists once for
//! each unordered pair of users and trip context; its key is canonical so
//! that both halves of a mutual like agree on it regardless of which side
//! completes the pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Swipes ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SwipeAction {
  Like,
  Pass,
}

/// One user's recorded decision about another user's trip. Never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
  pub swipe_id:   Uuid,
  pub actor_id:   Uuid,
  pub target_id:  Uuid,
  /// The target's trip the decision was made on.
  pub trip_id:    Uuid,
  pub action:     SwipeAction,
  pub created_at: DateTime<Utc>,
}

impl Swipe {
  pub fn is_like(&self) -> bool { self.action == SwipeAction::Like }
}

/// Input to [`crate::store::TravelStore::record_swipe`].
#[derive(Debug, Clone, Copy)]
pub struct NewSwipe {
  pub actor_id:  Uuid,
  pub target_id: Uuid,
  pub trip_id:   Uuid,
  pub action:    SwipeAction,
}

impl NewSwipe {
  pub fn validate(&self) -> Result<()> {
    if self.actor_id == self.target_id {
      return Err(Error::SelfSwipe);
    }
    Ok(())
  }
}

// ─── Matches ─────────────────────────────────────────────────────────────────

/// A confirmed mutual like. `user1_id < user2_id` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
  pub match_id:   Uuid,
  pub user1_id:   Uuid,
  pub user2_id:   Uuid,
  pub trip_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

impl Match {
  pub fn involves(&self, user_id: Uuid) -> bool {
    self.user1_id == user_id || self.user2_id == user_id
  }

  /// The other participant, or `None` if `user_id` is not part of the match.
  pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
    if self.user1_id == user_id {
      Some(self.user2_id)
    } else if self.user2_id == user_id {
      Some(self.user1_id)
    } else {
      None
    }
  }

  pub fn key(&self) -> MatchKey {
    MatchKey {
      user1_id: self.user1_id,
      user2_id: self.user2_id,
      trip_id:  self.trip_id,
    }
  }
}

/// The uniqueness key of a match: unordered user pair plus trip context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchKey {
  pub user1_id: Uuid,
  pub user2_id: Uuid,
  pub trip_id:  Uuid,
}

impl MatchKey {
  /// Derive the key for two complementary like-swipes, given in either
  /// order. The lower user id becomes `user1_id`, and the trip context is
  /// the trip that user liked.
  ///
  /// Returns `None` unless both swipes are likes and each targets the
  /// other's actor.
  pub fn for_mutual_like(a: &Swipe, b: &Swipe) -> Option<Self> {
    if !a.is_like() || !b.is_like() {
      return None;
    }
    if a.actor_id != b.target_id || a.target_id != b.actor_id {
      return None;
    }
    let (low, high) = if a.actor_id < b.actor_id { (a, b) } else { (b, a) };
    Some(Self {
      user1_id: low.actor_id,
      user2_id: high.actor_id,
      trip_id:  low.trip_id,
    })
  }
}

/// Result of recording a swipe: the stored row plus the match it completed
/// (or found already present), if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeOutcome {
  pub swipe:   Swipe,
  #[serde(rename = "match")]
  pub matched: Option<Match>,
}
