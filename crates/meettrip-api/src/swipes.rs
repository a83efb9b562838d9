//! `POST /swipes`: record a like or pass and resolve the mutual match.
//!
//! Body: `{"target_user_id": "…", "trip_id": "…", "action": "like"}`.
//! The trip must belong to the target. Returns 201 with `{swipe, match}`,
//! where `match` is non-null once both sides have liked. A repeated swipe
//! for the same target and trip is a 409.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use meettrip_core::{
  matching::{NewSwipe, SwipeAction},
  store::TravelStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SwipeBody {
  pub target_user_id: Uuid,
  pub trip_id:        Uuid,
  pub action:         SwipeAction,
}

/// `POST /swipes`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<SwipeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let input = NewSwipe {
    actor_id:  user.user_id,
    target_id: body.target_user_id,
    trip_id:   body.trip_id,
    action:    body.action,
  };
  input.validate()?;

  let trip = state
    .store
    .get_trip(body.trip_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("trip {} not found", body.trip_id)))?;
  if trip.owner_id != body.target_user_id {
    return Err(ApiError::BadRequest(format!(
      "trip {} does not belong to user {}",
      trip.trip_id, body.target_user_id
    )));
  }

  let outcome = state
    .store
    .record_swipe(input)
    .await
    .map_err(ApiError::store)?;

  if let Some(m) = &outcome.matched {
    tracing::info!(match_id = %m.match_id, trip_id = %m.trip_id, "mutual like matched");
  }
  Ok((StatusCode::CREATED, Json(outcome)))
}
