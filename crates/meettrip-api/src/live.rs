//! Live delivery of new messages over WebSocket.
//!
//! `GET /matches/:id/live[?after=<seq>]` upgrades to a socket that first
//! replays stored messages past the cursor and then forwards every message
//! sent to the match while the socket is open. Each frame is one JSON
//! [`Message`]. Counterpart messages delivered this way are marked read in
//! the background.
//!
//! The socket subscribes before it replays, so a message stored between the
//! two steps arrives on the channel as well as in the replay; the `seq`
//! high-water mark drops the second copy. Sends publish independently, so a
//! message can reach the channel ahead of its predecessor. When the next
//! `seq` skips past the mark, the socket fills the gap from the store before
//! going on; the predecessor that shows up later is then a copy. A receiver
//! that falls behind the channel capacity catches up from the store the same
//! way. Frames therefore always go out in `seq` order without gaps.

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard, PoisonError},
};

use axum::{
  extract::{
    Path, Query, State, WebSocketUpgrade,
    ws::{Message as Frame, WebSocket},
  },
  response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use meettrip_core::{message::Message, store::TravelStore};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  matches::{CursorParams, participant_match},
};

const CHANNEL_CAPACITY: usize = 64;

// ─── Hub ──────────────────────────────────────────────────────────────────────

/// Registry of per-match broadcast channels.
///
/// A channel exists only while someone listens on it; publishing to a match
/// with no listeners is a no-op.
#[derive(Debug, Default)]
pub struct LiveHub {
  channels: Mutex<HashMap<Uuid, broadcast::Sender<Message>>>,
}

impl LiveHub {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, broadcast::Sender<Message>>> {
    self.channels.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn subscribe(&self, match_id: Uuid) -> broadcast::Receiver<Message> {
    self
      .lock()
      .entry(match_id)
      .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
      .subscribe()
  }

  /// Deliver `message` to everyone listening on its match. Returns the
  /// number of receivers reached.
  pub fn publish(&self, message: &Message) -> usize {
    let mut channels = self.lock();
    let Some(tx) = channels.get(&message.match_id) else {
      return 0;
    };
    match tx.send(message.clone()) {
      Ok(n) => n,
      Err(_) => {
        channels.remove(&message.match_id);
        0
      }
    }
  }

  /// Drop the channel for `match_id` if its last receiver is gone.
  pub fn release(&self, match_id: Uuid) {
    let mut channels = self.lock();
    if let Some(tx) = channels.get(&match_id)
      && tx.receiver_count() == 0
    {
      channels.remove(&match_id);
    }
  }

  /// Number of matches with an open channel.
  pub fn channel_count(&self) -> usize { self.lock().len() }
}

// ─── Socket ───────────────────────────────────────────────────────────────────

/// `GET /matches/:id/live[?after=<seq>]`
pub async fn connect<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<CursorParams>,
  ws: WebSocketUpgrade,
) -> Result<Response, ApiError>
where
  S: TravelStore + Clone + 'static,
{
  let m = participant_match(&*state.store, id, user.user_id).await?;
  let viewer = user.user_id;
  let after = params.after.unwrap_or(0);
  Ok(ws.on_upgrade(move |socket| stream_match(state, viewer, m.match_id, after, socket)))
}

type Sink = SplitSink<WebSocket, Frame>;

/// What to do with a message received on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
  /// Already sent, either by replay or by an earlier gap fill.
  Skip,
  /// The direct successor of the last frame sent.
  Deliver,
  /// Earlier messages are still missing from the socket.
  FillGap,
}

fn next_step(last_seq: i64, seq: i64) -> Step {
  if seq <= last_seq {
    Step::Skip
  } else if seq == last_seq + 1 {
    Step::Deliver
  } else {
    Step::FillGap
  }
}

async fn stream_match<S>(state: AppState<S>, viewer: Uuid, match_id: Uuid, after: i64, socket: WebSocket)
where
  S: TravelStore + Clone + 'static,
{
  let mut rx = state.live.subscribe(match_id);
  let (mut sink, mut incoming) = socket.split();
  let mut last_seq = after;
  tracing::debug!(%match_id, %viewer, after, "live socket opened");

  if catch_up(&state, viewer, match_id, &mut last_seq, &mut sink).await.is_ok() {
    loop {
      tokio::select! {
        received = rx.recv() => match received {
          Ok(message) => {
            let sent = match next_step(last_seq, message.seq) {
              Step::Skip => continue,
              Step::Deliver => deliver(&state, viewer, &message, &mut last_seq, &mut sink).await,
              Step::FillGap => {
                tracing::debug!(%match_id, last_seq, seq = message.seq, "gap in live sequence; replaying from store");
                match catch_up(&state, viewer, match_id, &mut last_seq, &mut sink).await {
                  // The store could not be read; still forward what we hold.
                  Ok(()) if message.seq > last_seq => {
                    deliver(&state, viewer, &message, &mut last_seq, &mut sink).await
                  }
                  other => other,
                }
              }
            };
            if sent.is_err() {
              break;
            }
          }
          Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(%match_id, skipped, "live receiver lagged; replaying from store");
            if catch_up(&state, viewer, match_id, &mut last_seq, &mut sink).await.is_err() {
              break;
            }
          }
          Err(RecvError::Closed) => break,
        },
        frame = incoming.next() => match frame {
          Some(Ok(Frame::Close(_))) | Some(Err(_)) | None => break,
          Some(Ok(_)) => {}
        },
      }
    }
  }

  drop(rx);
  state.live.release(match_id);
  tracing::debug!(%match_id, %viewer, "live socket closed");
}

/// Send every stored message past `last_seq`. A store failure is logged and
/// leaves the socket on live messages only.
async fn catch_up<S>(
  state: &AppState<S>,
  viewer: Uuid,
  match_id: Uuid,
  last_seq: &mut i64,
  sink: &mut Sink,
) -> Result<(), axum::Error>
where
  S: TravelStore + Clone + 'static,
{
  let backlog = match state.store.list_messages(match_id, Some(*last_seq)).await {
    Ok(backlog) => backlog,
    Err(e) => {
      tracing::warn!(%match_id, error = %e, "live replay failed");
      return Ok(());
    }
  };
  for message in &backlog {
    deliver(state, viewer, message, last_seq, sink).await?;
  }
  Ok(())
}

async fn deliver<S>(
  state: &AppState<S>,
  viewer: Uuid,
  message: &Message,
  last_seq: &mut i64,
  sink: &mut Sink,
) -> Result<(), axum::Error>
where
  S: TravelStore + Clone + 'static,
{
  let frame = match serde_json::to_string(message) {
    Ok(json) => Frame::Text(json.into()),
    Err(e) => {
      tracing::error!(message_id = %message.message_id, error = %e, "unencodable message");
      return Ok(());
    }
  };
  sink.send(frame).await?;
  *last_seq = message.seq;

  if message.sender_id != viewer && !message.read {
    let store = state.store.clone();
    let message_id = message.message_id;
    tokio::spawn(async move {
      if let Err(e) = store.mark_message_read(message_id, viewer).await {
        tracing::warn!(%message_id, error = %e, "failed to mark delivered message read");
      }
    });
  }
  Ok(())
}
