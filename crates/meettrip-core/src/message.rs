//! Messages, the chat lines inside a match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub message_id: Uuid,
  pub match_id:   Uuid,
  pub sender_id:  Uuid,
  /// Per-match position, strictly increasing in insertion order. Clients
  /// resume a conversation from the last `seq` they saw.
  pub seq:        i64,
  pub content:    String,
  /// Flips false → true once, when the non-sender views the message.
  pub read:       bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::TravelStore::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
  pub match_id:  Uuid,
  pub sender_id: Uuid,
  pub content:   String,
}

impl NewMessage {
  /// Trim `content`; returns `None` when nothing is left to send.
  pub fn new(match_id: Uuid, sender_id: Uuid, content: &str) -> Option<Self> {
    let content = content.trim();
    if content.is_empty() {
      return None;
    }
    Some(Self { match_id, sender_id, content: content.to_owned() })
  }
}
