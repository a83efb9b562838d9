//! JSON and WebSocket API for MeetTrip.
//!
//! Exposes an axum [`Router`] backed by any [`TravelStore`]. Every route
//! except sign-up and log-in sits behind the bearer-session gate in
//! [`auth`]. TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = AppState::new(store, ApiConfig::default());
//! let app = Router::new().nest("/api", meettrip_api::api_router(state));
//! ```

pub mod auth;
pub mod discover;
pub mod error;
pub mod live;
pub mod matches;
pub mod profiles;
pub mod swipes;
pub mod trips;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use meettrip_core::store::TravelStore;

pub use error::{ApiError, Result};
pub use live::LiveHub;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings the API layer needs from the server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Lifetime of a bearer session issued at log-in.
  pub session_ttl_hours: u32,
}

impl Default for ApiConfig {
  fn default() -> Self { Self { session_ttl_hours: 720 } }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: TravelStore> {
  pub store:  Arc<S>,
  pub live:   Arc<LiveHub>,
  pub config: Arc<ApiConfig>,
}

impl<S: TravelStore> AppState<S> {
  pub fn new(store: S, config: ApiConfig) -> Self {
    Self {
      store:  Arc::new(store),
      live:   Arc::new(LiveHub::new()),
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: TravelStore + Clone + 'static,
{
  Router::new()
    // Identity
    .route("/auth/signup", post(auth::signup::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/session", get(auth::session::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    // Profiles
    .route("/profile", get(profiles::get_own::<S>).put(profiles::update::<S>))
    .route("/profiles/{id}", get(profiles::get_one::<S>))
    .route("/vocabulary", get(profiles::vocabulary::<S>))
    // Trips
    .route("/trips", get(trips::list::<S>).post(trips::create::<S>))
    .route(
      "/trips/{id}",
      get(trips::get_one::<S>)
        .put(trips::update::<S>)
        .delete(trips::delete_one::<S>),
    )
    .route("/trips/{id}/status", post(trips::set_status::<S>))
    // Discovery
    .route("/discover", get(discover::deck::<S>))
    .route("/discover/next", get(discover::next::<S>))
    .route("/swipes", post(swipes::create::<S>))
    // Matches & conversation
    .route("/matches", get(matches::list::<S>))
    .route("/matches/{id}", get(matches::conversation::<S>))
    .route(
      "/matches/{id}/messages",
      get(matches::messages::<S>).post(matches::send::<S>),
    )
    .route("/matches/{id}/read", post(matches::read::<S>))
    .route("/matches/{id}/live", get(live::connect::<S>))
    .with_state(state)
}
