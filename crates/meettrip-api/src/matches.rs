//! Handlers for matches and the conversation inside each one.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches`               | Newest first, with counterpart, trip summary and unread count |
//! | `GET`  | `/matches/:id`           | Marks counterpart messages read, then returns the thread |
//! | `GET`  | `/matches/:id/messages`  | Optional `?after=<seq>` cursor |
//! | `POST` | `/matches/:id/messages`  | Body: `{"content":"…"}`; 201, or 204 when blank |
//! | `POST` | `/matches/:id/read`      | Returns `{"updated": n}` |
//!
//! Only the two participants can see a match; anyone else gets a 404.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use futures_util::future::try_join_all;
use meettrip_core::{
  matching::Match,
  message::{Message, NewMessage},
  profile::{Profile, ProfileSummary},
  store::TravelStore,
  trip::{Trip, TripSummary},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// Fetch a match `viewer` takes part in.
pub(crate) async fn participant_match<S: TravelStore>(
  store: &S,
  id: Uuid,
  viewer: Uuid,
) -> Result<Match, ApiError> {
  store
    .get_match(id)
    .await
    .map_err(ApiError::store)?
    .filter(|m| m.involves(viewer))
    .ok_or_else(|| ApiError::NotFound(format!("match {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchListItem {
  #[serde(rename = "match")]
  pub matched:      Match,
  pub counterpart:  Option<ProfileSummary>,
  /// `None` once the trip has been deleted.
  pub trip:         Option<TripSummary>,
  pub unread_count: u64,
}

/// `GET /matches`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<MatchListItem>>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let viewer = user.user_id;
  let matches = state
    .store
    .list_matches(viewer)
    .await
    .map_err(ApiError::store)?;

  let store = &*state.store;
  let items = try_join_all(matches.into_iter().map(|m| async move {
    let counterpart = match m.counterpart(viewer) {
      Some(id) => store.get_profile(id).await.map_err(ApiError::store)?,
      None => None,
    };
    let trip = store.get_trip(m.trip_id).await.map_err(ApiError::store)?;
    let unread_count = store
      .count_unread(m.match_id, viewer)
      .await
      .map_err(ApiError::store)?;
    Ok::<_, ApiError>(MatchListItem {
      counterpart: counterpart.as_ref().map(ProfileSummary::from),
      trip: trip.as_ref().map(TripSummary::from),
      unread_count,
      matched: m,
    })
  }))
  .await?;

  Ok(Json(items))
}

// ─── Conversation ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Conversation {
  #[serde(rename = "match")]
  pub matched:     Match,
  pub counterpart: Option<Profile>,
  pub trip:        Option<Trip>,
  pub messages:    Vec<Message>,
}

/// `GET /matches/:id`
pub async fn conversation<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Conversation>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let store = &*state.store;
  let m = participant_match(store, id, user.user_id).await?;

  let marked = store
    .mark_read(m.match_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  if marked > 0 {
    tracing::debug!(match_id = %m.match_id, marked, "messages marked read");
  }

  let counterpart = match m.counterpart(user.user_id) {
    Some(other) => store.get_profile(other).await.map_err(ApiError::store)?,
    None => None,
  };
  let trip = store.get_trip(m.trip_id).await.map_err(ApiError::store)?;
  let messages = store
    .list_messages(m.match_id, None)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(Conversation { matched: m, counterpart, trip, messages }))
}

// ─── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CursorParams {
  /// Only return messages with a `seq` greater than this.
  pub after: Option<i64>,
}

/// `GET /matches/:id/messages[?after=<seq>]`
pub async fn messages<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<CursorParams>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let m = participant_match(&*state.store, id, user.user_id).await?;
  let messages = state
    .store
    .list_messages(m.match_id, params.after)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub content: String,
}

/// `POST /matches/:id/messages`
pub async fn send<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<SendBody>,
) -> Result<Response, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let m = participant_match(&*state.store, id, user.user_id).await?;
  let Some(input) = NewMessage::new(m.match_id, user.user_id, &body.content) else {
    return Ok(StatusCode::NO_CONTENT.into_response());
  };

  let message = state
    .store
    .send_message(input)
    .await
    .map_err(ApiError::store)?;
  let listeners = state.live.publish(&message);
  tracing::debug!(match_id = %m.match_id, seq = message.seq, listeners, "message sent");

  Ok((StatusCode::CREATED, Json(message)).into_response())
}

// ─── Read ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadResponse {
  pub updated: u64,
}

/// `POST /matches/:id/read`
pub async fn read<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ReadResponse>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let m = participant_match(&*state.store, id, user.user_id).await?;
  let updated = state
    .store
    .mark_read(m.match_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ReadResponse { updated }))
}
