//! Discovery: choosing which trips a viewer gets to swipe on.
//!
//! Compatibility is narrow: same destination string, active,
//! owned by someone else, and owned by someone the viewer has never swiped
//! on. The swipe history is keyed by target user only, so passing on a
//! person for one trip hides them for every other trip too. No ranking is
//! applied; candidates keep storage order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{profile::Profile, trip::Trip};

/// One card in the discovery deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub profile: Profile,
  pub trip:    Trip,
}

/// The trip a viewer discovers from: the first active one, in the order
/// given.
pub fn viewer_trip(own_trips: &[Trip]) -> Option<&Trip> {
  own_trips.iter().find(|t| t.is_active())
}

/// Filter `trips` down to the ones `viewer_id` may be shown for
/// `viewer_trip`, preserving order.
pub fn select_candidates(
  viewer_id: Uuid,
  viewer_trip: &Trip,
  trips: impl IntoIterator<Item = Trip>,
  swiped_targets: &HashSet<Uuid>,
) -> Vec<Trip> {
  trips
    .into_iter()
    .filter(|t| t.is_active())
    .filter(|t| t.destination == viewer_trip.destination)
    .filter(|t| t.owner_id != viewer_id)
    .filter(|t| !swiped_targets.contains(&t.owner_id))
    .collect()
}
