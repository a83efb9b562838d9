//! The SQLite implementation of [`TravelStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use meettrip_core::{
  account::{Account, NewAccount, Session},
  matching::{Match, MatchKey, NewSwipe, Swipe, SwipeOutcome},
  message::{Message, NewMessage},
  profile::{Profile, ProfileUpdate},
  store::TravelStore,
  trip::{Trip, TripDraft, TripStatus},
};

use crate::{
  Error, Result,
  encode::{
    MATCH_COLUMNS, MESSAGE_COLUMNS, PROFILE_COLUMNS, RawAccount, RawMatch,
    RawMessage, RawProfile, RawSwipe, RawTrip, SWIPE_COLUMNS, TRIP_COLUMNS,
    decode_dt, decode_uuid, encode_date, encode_dt, encode_tags, encode_uuid,
  },
  schema::SCHEMA,
};

/// Carry one of our own errors out of a `Connection::call` closure.
fn in_call(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A MeetTrip store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised on the connection's thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_trips(&self, sql: String, key: String) -> Result<Vec<Trip>> {
    let raws: Vec<RawTrip> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key], RawTrip::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTrip::into_trip).collect()
  }

  async fn count(&self, sql: &'static str, a: String, b: Option<String>) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        let n = match b {
          Some(b) => conn.query_row(sql, rusqlite::params![a, b], |r| r.get(0))?,
          None => conn.query_row(sql, rusqlite::params![a], |r| r.get(0))?,
        };
        Ok(n)
      })
      .await?;
    Ok(n.max(0) as u64)
  }
}

// ─── TravelStore impl ────────────────────────────────────────────────────────

impl TravelStore for SqliteStore {
  type Error = Error;

  // ── Accounts & sessions ───────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Profile> {
    let now = Utc::now();
    let profile = Profile {
      profile_id: Uuid::new_v4(),
      name:       input.name,
      age:        input.age,
      bio:        input.bio,
      photo_url:  input.photo_url,
      languages:  Default::default(),
      interests:  Default::default(),
      created_at: now,
      updated_at: now,
    };

    let id_str    = encode_uuid(profile.profile_id);
    let email     = input.email.clone();
    let hash      = input.password_hash;
    let name      = profile.name.clone();
    let age       = profile.age;
    let bio       = profile.bio.clone();
    let photo_url = profile.photo_url.clone();
    let langs     = encode_tags(&profile.languages)?;
    let interests = encode_tags(&profile.interests)?;
    let at_str    = encode_dt(now);

    let created: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM profiles WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO profiles (
             profile_id, email, password_hash, name, age, bio, photo_url,
             languages, interests, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str, email, hash, name, age, bio, photo_url, langs, interests, at_str,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::DuplicateEmail(input.email));
    }
    Ok(profile)
  }

  async fn find_account(&self, email: &str) -> Result<Option<Account>> {
    let email = email.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT profile_id, email, password_hash FROM profiles WHERE email = ?1",
            rusqlite::params![email],
            |row| {
              Ok(RawAccount {
                profile_id:    row.get(0)?,
                email:         row.get(1)?,
                password_hash: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn resolve_session(
    &self,
    token_hash: &str,
    now:        DateTime<Utc>,
  ) -> Result<Option<Uuid>> {
    let token_hash = token_hash.to_owned();

    let row: Option<(String, String, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
          )
          .optional()?)
      })
      .await?;

    let Some((token_hash, user_str, created_str, expires_str)) = row else {
      return Ok(None);
    };
    let session = Session {
      token_hash,
      user_id:    decode_uuid(&user_str)?,
      created_at: decode_dt(&created_str)?,
      expires_at: decode_dt(&expires_str)?,
    };
    if session.is_expired(now) {
      self.delete_session(&session.token_hash).await?;
      tracing::debug!(user_id = %session.user_id, "expired session removed");
      return Ok(None);
    }
    Ok(Some(session.user_id))
  }

  async fn delete_session(&self, token_hash: &str) -> Result<bool> {
    let token_hash = token_hash.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
            rusqlite::params![id_str],
            RawProfile::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn update_profile(
    &self,
    id:     Uuid,
    update: ProfileUpdate,
  ) -> Result<Option<Profile>> {
    let id_str    = encode_uuid(id);
    let langs     = encode_tags(&update.languages)?;
    let interests = encode_tags(&update.interests)?;
    let at_str    = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles
             SET name = ?2, age = ?3, bio = ?4, photo_url = ?5,
                 languages = ?6, interests = ?7, updated_at = ?8
           WHERE profile_id = ?1",
          rusqlite::params![
            id_str,
            update.name,
            update.age,
            update.bio,
            update.photo_url,
            langs,
            interests,
            at_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_profile(id).await
  }

  // ── Trips ─────────────────────────────────────────────────────────────────

  async fn create_trip(&self, owner_id: Uuid, draft: TripDraft) -> Result<Trip> {
    let now = Utc::now();
    let trip = Trip {
      trip_id:             Uuid::new_v4(),
      owner_id,
      destination:         draft.destination,
      destination_country: draft.destination_country,
      start_date:          draft.start_date,
      end_date:            draft.end_date,
      travel_style:        draft.travel_style,
      interests:           draft.interests,
      status:              TripStatus::Active,
      created_at:          now,
      updated_at:          now,
    };

    let id_str      = encode_uuid(trip.trip_id);
    let owner_str   = encode_uuid(owner_id);
    let destination = trip.destination.clone();
    let country     = trip.destination_country.clone();
    let start_str   = encode_date(trip.start_date);
    let end_str     = encode_date(trip.end_date);
    let style_str   = encode_tags(&trip.travel_style)?;
    let interests   = encode_tags(&trip.interests)?;
    let status_str  = trip.status.to_string();
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO trips (
             trip_id, owner_id, destination, destination_country,
             start_date, end_date, travel_style, interests, status,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str, owner_str, destination, country, start_str, end_str,
            style_str, interests, status_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(trip)
  }

  async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTrip> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {TRIP_COLUMNS} FROM trips WHERE trip_id = ?1"),
            rusqlite::params![id_str],
            RawTrip::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTrip::into_trip).transpose()
  }

  async fn list_trips(&self, owner_id: Uuid) -> Result<Vec<Trip>> {
    self
      .query_trips(
        format!(
          "SELECT {TRIP_COLUMNS} FROM trips WHERE owner_id = ?1
           ORDER BY start_date DESC, rowid DESC"
        ),
        encode_uuid(owner_id),
      )
      .await
  }

  async fn active_trips(&self, owner_id: Uuid) -> Result<Vec<Trip>> {
    self
      .query_trips(
        format!(
          "SELECT {TRIP_COLUMNS} FROM trips
           WHERE owner_id = ?1 AND status = 'active'
           ORDER BY rowid"
        ),
        encode_uuid(owner_id),
      )
      .await
  }

  async fn trips_to(&self, destination: &str) -> Result<Vec<Trip>> {
    self
      .query_trips(
        format!(
          "SELECT {TRIP_COLUMNS} FROM trips
           WHERE destination = ?1 AND status = 'active'
           ORDER BY rowid"
        ),
        destination.to_owned(),
      )
      .await
  }

  async fn update_trip(&self, id: Uuid, draft: TripDraft) -> Result<Option<Trip>> {
    let id_str    = encode_uuid(id);
    let start_str = encode_date(draft.start_date);
    let end_str   = encode_date(draft.end_date);
    let style_str = encode_tags(&draft.travel_style)?;
    let interests = encode_tags(&draft.interests)?;
    let at_str    = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE trips
             SET destination = ?2, destination_country = ?3,
                 start_date = ?4, end_date = ?5,
                 travel_style = ?6, interests = ?7, updated_at = ?8
           WHERE trip_id = ?1",
          rusqlite::params![
            id_str,
            draft.destination,
            draft.destination_country,
            start_str,
            end_str,
            style_str,
            interests,
            at_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_trip(id).await
  }

  async fn set_trip_status(&self, id: Uuid, status: TripStatus) -> Result<Option<Trip>> {
    let id_str     = encode_uuid(id);
    let status_str = status.to_string();
    let at_str     = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE trips SET status = ?2, updated_at = ?3 WHERE trip_id = ?1",
          rusqlite::params![id_str, status_str, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_trip(id).await
  }

  async fn delete_trip(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM trips WHERE trip_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn count_trip_matches(&self, trip_id: Uuid) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM matches WHERE trip_id = ?1", encode_uuid(trip_id), None)
      .await
  }

  // ── Swipes ────────────────────────────────────────────────────────────────

  async fn swiped_targets(&self, actor_id: Uuid) -> Result<Vec<Uuid>> {
    let actor_str = encode_uuid(actor_id);

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT DISTINCT target_id FROM swipes WHERE actor_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![actor_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn record_swipe(&self, input: NewSwipe) -> Result<SwipeOutcome> {
    let swipe = Swipe {
      swipe_id:   Uuid::new_v4(),
      actor_id:   input.actor_id,
      target_id:  input.target_id,
      trip_id:    input.trip_id,
      action:     input.action,
      created_at: Utc::now(),
    };
    let new = swipe.clone();

    // The swipe insert, the reverse-like lookup and the match insert share
    // one transaction. The UNIQUE key on matches absorbs the second half of
    // a pair completed from both sides.
    let outcome: Option<Option<RawMatch>> = self
      .conn
      .call(move |conn| {
        let swipe_str  = encode_uuid(new.swipe_id);
        let actor_str  = encode_uuid(new.actor_id);
        let target_str = encode_uuid(new.target_id);
        let trip_str   = encode_uuid(new.trip_id);
        let action_str = new.action.to_string();
        let at_str     = encode_dt(new.created_at);

        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO swipes (swipe_id, actor_id, target_id, trip_id, action, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![swipe_str, actor_str, target_str, trip_str, action_str, at_str],
        )?;
        if inserted == 0 {
          return Ok(None);
        }

        if !new.is_like() {
          tx.commit()?;
          return Ok(Some(None));
        }

        let reverse = tx
          .query_row(
            &format!(
              "SELECT {SWIPE_COLUMNS} FROM swipes
               WHERE actor_id = ?1 AND target_id = ?2 AND action = 'like'
               ORDER BY rowid LIMIT 1"
            ),
            rusqlite::params![target_str, actor_str],
            RawSwipe::from_row,
          )
          .optional()?;

        let Some(reverse) = reverse else {
          tx.commit()?;
          return Ok(Some(None));
        };
        let reverse = reverse.into_swipe().map_err(in_call)?;
        let Some(key) = MatchKey::for_mutual_like(&new, &reverse) else {
          tx.commit()?;
          return Ok(Some(None));
        };

        let user1_str = encode_uuid(key.user1_id);
        let user2_str = encode_uuid(key.user2_id);
        let ctx_str   = encode_uuid(key.trip_id);
        let created = tx.execute(
          "INSERT OR IGNORE INTO matches (match_id, user1_id, user2_id, trip_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![encode_uuid(Uuid::new_v4()), user1_str, user2_str, ctx_str, at_str],
        )?;
        if created > 0 {
          tracing::debug!(user1 = %key.user1_id, user2 = %key.user2_id, "match row inserted");
        }

        let raw = tx.query_row(
          &format!(
            "SELECT {MATCH_COLUMNS} FROM matches
             WHERE user1_id = ?1 AND user2_id = ?2 AND trip_id = ?3"
          ),
          rusqlite::params![user1_str, user2_str, ctx_str],
          RawMatch::from_row,
        )?;
        tx.commit()?;
        Ok(Some(Some(raw)))
      })
      .await?;

    let Some(raw_match) = outcome else {
      return Err(Error::DuplicateSwipe {
        actor:  swipe.actor_id,
        target: swipe.target_id,
        trip:   swipe.trip_id,
      });
    };

    Ok(SwipeOutcome {
      swipe,
      matched: raw_match.map(RawMatch::into_match).transpose()?,
    })
  }

  // ── Matches ───────────────────────────────────────────────────────────────

  async fn get_match(&self, id: Uuid) -> Result<Option<Match>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMatch> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ?1"),
            rusqlite::params![id_str],
            RawMatch::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMatch::into_match).transpose()
  }

  async fn list_matches(&self, user_id: Uuid) -> Result<Vec<Match>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MATCH_COLUMNS} FROM matches
           WHERE user1_id = ?1 OR user2_id = ?1
           ORDER BY rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawMatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatch::into_match).collect()
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn send_message(&self, input: NewMessage) -> Result<Message> {
    let message_id = Uuid::new_v4();
    let created_at = Utc::now();

    let id_str     = encode_uuid(message_id);
    let match_str  = encode_uuid(input.match_id);
    let sender_str = encode_uuid(input.sender_id);
    let content    = input.content.clone();
    let at_str     = encode_dt(created_at);

    let seq: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let seq: i64 = tx.query_row(
          "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE match_id = ?1",
          rusqlite::params![match_str],
          |r| r.get(0),
        )?;
        tx.execute(
          "INSERT INTO messages (message_id, match_id, sender_id, seq, content, read, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
          rusqlite::params![id_str, match_str, sender_str, seq, content, at_str],
        )?;
        tx.commit()?;
        Ok(seq)
      })
      .await?;

    Ok(Message {
      message_id,
      match_id: input.match_id,
      sender_id: input.sender_id,
      seq,
      content: input.content,
      read: false,
      created_at,
    })
  }

  async fn list_messages(&self, match_id: Uuid, after_seq: Option<i64>) -> Result<Vec<Message>> {
    let match_str = encode_uuid(match_id);
    let after     = after_seq.unwrap_or(0);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE match_id = ?1 AND seq > ?2
           ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![match_str, after], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn mark_read(&self, match_id: Uuid, reader: Uuid) -> Result<u64> {
    let match_str  = encode_uuid(match_id);
    let reader_str = encode_uuid(reader);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE messages SET read = 1
           WHERE match_id = ?1 AND sender_id != ?2 AND read = 0",
          rusqlite::params![match_str, reader_str],
        )?)
      })
      .await?;
    Ok(changed as u64)
  }

  async fn mark_message_read(&self, message_id: Uuid, reader: Uuid) -> Result<bool> {
    let id_str     = encode_uuid(message_id);
    let reader_str = encode_uuid(reader);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE messages SET read = 1
           WHERE message_id = ?1 AND sender_id != ?2 AND read = 0",
          rusqlite::params![id_str, reader_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn count_unread(&self, match_id: Uuid, reader: Uuid) -> Result<u64> {
    self
      .count(
        "SELECT COUNT(*) FROM messages
         WHERE match_id = ?1 AND sender_id != ?2 AND read = 0",
        encode_uuid(match_id),
        Some(encode_uuid(reader)),
      )
      .await
  }
}
