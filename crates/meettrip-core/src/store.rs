//! The `TravelStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `meettrip-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  account::{Account, NewAccount, Session},
  matching::{Match, NewSwipe, SwipeOutcome},
  message::{Message, NewMessage},
  profile::{Profile, ProfileUpdate},
  trip::{Trip, TripDraft, TripStatus},
};

/// Backend errors must say whether a write lost to a uniqueness constraint,
/// so callers can report a conflict instead of a fault.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_conflict(&self) -> bool;
}

/// Abstraction over a MeetTrip storage backend.
///
/// Swipes and matches are append-only. Messages are append-only apart from
/// their read flag, which only ever moves from false to true.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TravelStore: Send + Sync {
  type Error: StoreError;

  // ── Accounts & sessions ───────────────────────────────────────────────

  /// Create an account and its profile in one step. Fails with a conflict
  /// if the email is already registered.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Look up credentials by (normalised) email.
  fn find_account<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token digest to its user. Expired sessions resolve to `None`
  /// and are deleted.
  fn resolve_session<'a>(
    &'a self,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  /// Returns `true` if a session was removed.
  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Replace the editable attributes. Returns `None` if the profile does not
  /// exist.
  fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  // ── Trips ─────────────────────────────────────────────────────────────

  /// Create an active trip owned by `owner_id`.
  fn create_trip(
    &self,
    owner_id: Uuid,
    draft: TripDraft,
  ) -> impl Future<Output = Result<Trip, Self::Error>> + Send + '_;

  fn get_trip(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Trip>, Self::Error>> + Send + '_;

  /// All trips of `owner_id`, latest start date first.
  fn list_trips(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Trip>, Self::Error>> + Send + '_;

  /// Active trips of `owner_id`, in creation order.
  fn active_trips(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Trip>, Self::Error>> + Send + '_;

  /// Active trips whose destination equals `destination` exactly, in
  /// storage order.
  fn trips_to<'a>(
    &'a self,
    destination: &'a str,
  ) -> impl Future<Output = Result<Vec<Trip>, Self::Error>> + Send + 'a;

  fn update_trip(
    &self,
    id: Uuid,
    draft: TripDraft,
  ) -> impl Future<Output = Result<Option<Trip>, Self::Error>> + Send + '_;

  fn set_trip_status(
    &self,
    id: Uuid,
    status: TripStatus,
  ) -> impl Future<Output = Result<Option<Trip>, Self::Error>> + Send + '_;

  /// Delete a trip. Swipes and matches that reference it are kept.
  /// Returns `true` if a row was removed.
  fn delete_trip(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Number of matches whose trip context is `trip_id`.
  fn count_trip_matches(
    &self,
    trip_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Swipes ────────────────────────────────────────────────────────────

  /// Every user `actor_id` has swiped on, for any trip.
  fn swiped_targets(
    &self,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Record a swipe and, for a like, resolve the mutual match atomically.
  ///
  /// At most one match exists per unordered user pair and trip context no
  /// matter how many times, or from which side, the pair is completed. A
  /// repeated swipe for the same (actor, target, trip) is a conflict.
  fn record_swipe(
    &self,
    input: NewSwipe,
  ) -> impl Future<Output = Result<SwipeOutcome, Self::Error>> + Send + '_;

  // ── Matches ───────────────────────────────────────────────────────────

  fn get_match(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// Matches `user_id` takes part in, newest first.
  fn list_matches(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Append a message, assigning the next `seq` for its match.
  fn send_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Messages of a match ascending by `seq`, optionally only those after a
  /// cursor.
  fn list_messages(
    &self,
    match_id: Uuid,
    after_seq: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Mark every unread message in `match_id` not sent by `reader` as read.
  /// Returns the number of messages changed.
  fn mark_read(
    &self,
    match_id: Uuid,
    reader: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Mark one message read on behalf of `reader`. A no-op for the reader's
  /// own messages. Returns `true` if the flag changed.
  fn mark_message_read(
    &self,
    message_id: Uuid,
    reader: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Unread messages in `match_id` that `reader` did not send.
  fn count_unread(
    &self,
    match_id: Uuid,
    reader: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
