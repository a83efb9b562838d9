//! Handlers for the trip editor.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/trips`            | Caller's trips, latest start first, with match counts |
//! | `POST`   | `/trips`            | Body: [`TripDraft`]; returns 201 + trip |
//! | `GET`    | `/trips/:id`        | 404 if not found |
//! | `PUT`    | `/trips/:id`        | Owner only; body: [`TripDraft`] |
//! | `DELETE` | `/trips/:id`        | Owner only; 204. Matches on the trip are kept |
//! | `POST`   | `/trips/:id/status` | Owner only; body: `{"status":"completed"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use futures_util::future::try_join_all;
use meettrip_core::{
  store::TravelStore,
  trip::{Trip, TripDraft, TripStatus},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// Fetch a trip the caller owns. Someone else's trip reads as missing.
async fn owned_trip<S: TravelStore>(store: &S, id: Uuid, owner: Uuid) -> Result<Trip, ApiError> {
  store
    .get_trip(id)
    .await
    .map_err(ApiError::store)?
    .filter(|t| t.owner_id == owner)
    .ok_or_else(|| ApiError::NotFound(format!("trip {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct TripListItem {
  #[serde(flatten)]
  pub trip:        Trip,
  pub match_count: u64,
}

/// `GET /trips`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<TripListItem>>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let trips = state
    .store
    .list_trips(user.user_id)
    .await
    .map_err(ApiError::store)?;

  let store = &state.store;
  let items = try_join_all(trips.into_iter().map(|trip| async move {
    let match_count = store
      .count_trip_matches(trip.trip_id)
      .await
      .map_err(ApiError::store)?;
    Ok::<_, ApiError>(TripListItem { trip, match_count })
  }))
  .await?;

  Ok(Json(items))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /trips`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<TripDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let draft = body.normalized()?;
  let trip = state
    .store
    .create_trip(user.user_id, draft)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(trip_id = %trip.trip_id, destination = %trip.destination, "trip created");
  Ok((StatusCode::CREATED, Json(trip)))
}

// ─── Get / update / delete ────────────────────────────────────────────────────

/// `GET /trips/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Trip>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let trip = state
    .store
    .get_trip(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("trip {id} not found")))?;
  Ok(Json(trip))
}

/// `PUT /trips/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<TripDraft>,
) -> Result<Json<Trip>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let draft = body.normalized()?;
  owned_trip(&*state.store, id, user.user_id).await?;
  let trip = state
    .store
    .update_trip(id, draft)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("trip {id} not found")))?;
  Ok(Json(trip))
}

/// `DELETE /trips/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  owned_trip(&*state.store, id, user.user_id).await?;
  state.store.delete_trip(id).await.map_err(ApiError::store)?;
  tracing::info!(trip_id = %id, "trip deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: TripStatus,
}

/// `POST /trips/:id/status`
pub async fn set_status<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Trip>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  owned_trip(&*state.store, id, user.user_id).await?;
  let trip = state
    .store
    .set_trip_status(id, body.status)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("trip {id} not found")))?;
  tracing::debug!(trip_id = %id, status = %trip.status, "trip status changed");
  Ok(Json(trip))
}
