//! Handlers for the profile editor.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profile`       | The caller's own profile |
//! | `PUT`  | `/profile`       | Body: [`ProfileUpdate`]; full replacement |
//! | `GET`  | `/profiles/:id`  | 404 if not found |
//! | `GET`  | `/vocabulary`    | Recognized languages, interests and styles |

use axum::{
  Json,
  extract::{Path, State},
};
use meettrip_core::{
  profile::{Profile, ProfileUpdate},
  store::TravelStore,
  vocabulary::{VOCABULARY, Vocabulary},
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /profile`
pub async fn get_own<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Profile>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let profile = state
    .store
    .get_profile(user.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {} not found", user.user_id)))?;
  Ok(Json(profile))
}

/// `GET /profiles/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let profile = state
    .store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}

/// `PUT /profile`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let update = body.normalized()?;
  let profile = state
    .store
    .update_profile(user.user_id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {} not found", user.user_id)))?;
  tracing::debug!(user_id = %user.user_id, "profile updated");
  Ok(Json(profile))
}

/// `GET /vocabulary`
pub async fn vocabulary<S>(_user: CurrentUser) -> Json<Vocabulary>
where
  S: TravelStore + Clone + 'static,
{
  Json(VOCABULARY)
}
