//! Handlers for discovery.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/discover`      | `{trip, candidates}`; 409 if the caller has no active trip |
//! | `GET`  | `/discover/next` | Head of the same deck, or `null` when exhausted |

use std::collections::HashSet;

use axum::{Json, extract::State};
use futures_util::future::try_join_all;
use meettrip_core::{
  discovery::{self, Candidate},
  store::TravelStore,
  trip::Trip,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Deck {
  /// The viewer's trip the deck was built for.
  pub trip:       Trip,
  pub candidates: Vec<Candidate>,
}

/// Build the viewer's deck from scratch. Nothing is cached between calls,
/// so swiped owners drop out as soon as the swipe is stored.
async fn build_deck<S: TravelStore>(store: &S, viewer: Uuid) -> Result<Deck, ApiError> {
  let own = store.active_trips(viewer).await.map_err(ApiError::store)?;
  let trip = discovery::viewer_trip(&own)
    .cloned()
    .ok_or_else(|| ApiError::Conflict("create a trip first".into()))?;

  let pool = store
    .trips_to(&trip.destination)
    .await
    .map_err(ApiError::store)?;
  let swiped: HashSet<Uuid> = store
    .swiped_targets(viewer)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .collect();
  let trips = discovery::select_candidates(viewer, &trip, pool, &swiped);

  let cards = try_join_all(trips.into_iter().map(|trip| async move {
    let profile = store
      .get_profile(trip.owner_id)
      .await
      .map_err(ApiError::store)?;
    Ok::<_, ApiError>(profile.map(|profile| Candidate { profile, trip }))
  }))
  .await?;

  let candidates: Vec<Candidate> = cards.into_iter().flatten().collect();
  tracing::debug!(
    viewer = %viewer,
    destination = %trip.destination,
    candidates = candidates.len(),
    "deck built"
  );
  Ok(Deck { trip, candidates })
}

/// `GET /discover`
pub async fn deck<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Deck>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  Ok(Json(build_deck(&*state.store, user.user_id).await?))
}

/// `GET /discover/next`
pub async fn next<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Option<Candidate>>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let deck = build_deck(&*state.store, user.user_id).await?;
  Ok(Json(deck.candidates.into_iter().next()))
}
