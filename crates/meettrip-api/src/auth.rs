//! The identity gate: sign-up, log-in, bearer sessions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup`  | Body: [`SignupBody`]; returns 201 + profile |
//! | `POST` | `/auth/login`   | Body: `{"email","password"}`; returns `{token, user_id}` |
//! | `GET`  | `/auth/session` | Returns `{user_id}` for the presented token |
//! | `POST` | `/auth/logout`  | Deletes the presented session; 204 |
//!
//! Tokens are random and handed out once; the store only ever sees their
//! SHA-256 digest.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, Query, State},
  http::{StatusCode, header, request::Parts},
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use meettrip_core::{
  account::{self, NewAccount, Session},
  store::TravelStore,
};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

const TOKEN_BYTES: usize = 32;

// ─── Tokens & passwords ───────────────────────────────────────────────────────

/// A fresh bearer token: 32 bytes from the OS RNG, URL-safe base64.
pub fn generate_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest of a token, the form sessions are stored under.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("password hashing failed: {e}").into()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The authenticated caller. Present in a handler means the request carried
/// a live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub user_id:    Uuid,
  pub token_hash: String,
}

#[derive(Deserialize)]
struct TokenQuery {
  access_token: Option<String>,
}

/// The presented token: `Authorization: Bearer …`, or `?access_token=…` for
/// clients that cannot set headers on a WebSocket upgrade.
fn presented_token(parts: &Parts) -> Option<String> {
  if let Some(value) = parts.headers.get(header::AUTHORIZATION)
    && let Ok(value) = value.to_str()
    && let Some(token) = value.strip_prefix("Bearer ")
  {
    return Some(token.trim().to_owned());
  }
  Query::<TokenQuery>::try_from_uri(&parts.uri)
    .ok()
    .and_then(|Query(q)| q.access_token)
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: TravelStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = presented_token(parts).ok_or(ApiError::Unauthorized)?;
    let token_hash = hash_token(&token);
    let user_id = state
      .store
      .resolve_session(&token_hash, Utc::now())
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;
    Ok(CurrentUser { user_id, token_hash })
  }
}

// ─── Sign up ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub email:     String,
  pub password:  String,
  pub name:      String,
  pub age:       u32,
  #[serde(default)]
  pub bio:       Option<String>,
  #[serde(default)]
  pub photo_url: Option<String>,
}

/// `POST /auth/signup`
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  account::validate_password(&body.password)?;
  let input = NewAccount {
    email:         body.email,
    password_hash: String::new(),
    name:          body.name,
    age:           body.age,
    bio:           body.bio,
    photo_url:     body.photo_url,
  }
  .normalized()?;
  let input = NewAccount { password_hash: hash_password(&body.password)?, ..input };

  let profile = state
    .store
    .create_account(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %profile.profile_id, "account created");
  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Log in ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token:   String,
  pub user_id: Uuid,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let email = account::normalize_email(&body.email).map_err(|_| ApiError::Unauthorized)?;
  let account = state
    .store
    .find_account(&email)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(&body.password, &account.password_hash) {
    tracing::debug!(user_id = %account.user_id, "rejected login");
    return Err(ApiError::Unauthorized);
  }

  let token = generate_token();
  let now = Utc::now();
  state
    .store
    .create_session(Session {
      token_hash: hash_token(&token),
      user_id:    account.user_id,
      created_at: now,
      expires_at: now + Duration::hours(i64::from(state.config.session_ttl_hours)),
    })
    .await
    .map_err(ApiError::store)?;

  Ok(Json(LoginResponse { token, user_id: account.user_id }))
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// `GET /auth/session`
pub async fn session<S>(user: CurrentUser) -> Json<serde_json::Value>
where
  S: TravelStore + Clone + 'static,
{
  Json(serde_json::json!({ "user_id": user.user_id }))
}

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  state
    .store
    .delete_session(&user.token_hash)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
