//! SQL schema for the MeetTrip SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per account; the profile is the public half of it.
CREATE TABLE IF NOT EXISTS profiles (
    profile_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name          TEXT NOT NULL,
    age           INTEGER NOT NULL,
    bio           TEXT,
    photo_url     TEXT,
    languages     TEXT NOT NULL DEFAULT '[]',   -- JSON array
    interests     TEXT NOT NULL DEFAULT '[]',   -- JSON array
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Only the SHA-256 digest of a bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES profiles(profile_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trips (
    trip_id             TEXT PRIMARY KEY,
    owner_id            TEXT NOT NULL REFERENCES profiles(profile_id),
    destination         TEXT NOT NULL,
    destination_country TEXT NOT NULL,
    start_date          TEXT NOT NULL,   -- YYYY-MM-DD
    end_date            TEXT NOT NULL,   -- YYYY-MM-DD
    travel_style        TEXT NOT NULL DEFAULT '[]',
    interests           TEXT NOT NULL DEFAULT '[]',
    status              TEXT NOT NULL DEFAULT 'active',
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    CHECK (status IN ('active', 'completed', 'cancelled'))
);

-- Swipes are strictly append-only. trip_id carries no foreign key so that
-- deleting a trip leaves the history intact.
CREATE TABLE IF NOT EXISTS swipes (
    swipe_id   TEXT PRIMARY KEY,
    actor_id   TEXT NOT NULL REFERENCES profiles(profile_id),
    target_id  TEXT NOT NULL REFERENCES profiles(profile_id),
    trip_id    TEXT NOT NULL,
    action     TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (actor_id, target_id, trip_id),
    CHECK  (actor_id != target_id),
    CHECK  (action IN ('like', 'pass'))
);

-- At most one match per unordered pair and trip context.
CREATE TABLE IF NOT EXISTS matches (
    match_id   TEXT PRIMARY KEY,
    user1_id   TEXT NOT NULL REFERENCES profiles(profile_id),
    user2_id   TEXT NOT NULL REFERENCES profiles(profile_id),
    trip_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user1_id, user2_id, trip_id),
    CHECK  (user1_id < user2_id)
);

CREATE TABLE IF NOT EXISTS messages (
    message_id TEXT PRIMARY KEY,
    match_id   TEXT NOT NULL REFERENCES matches(match_id),
    sender_id  TEXT NOT NULL REFERENCES profiles(profile_id),
    seq        INTEGER NOT NULL,
    content    TEXT NOT NULL,
    read       INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE (match_id, seq)
);

CREATE INDEX IF NOT EXISTS trips_owner_idx        ON trips(owner_id);
CREATE INDEX IF NOT EXISTS trips_destination_idx  ON trips(destination, status);
CREATE INDEX IF NOT EXISTS swipes_target_idx      ON swipes(target_id, actor_id);
CREATE INDEX IF NOT EXISTS matches_user2_idx      ON matches(user2_id);
CREATE INDEX IF NOT EXISTS matches_trip_idx       ON matches(trip_id);
CREATE INDEX IF NOT EXISTS messages_unread_idx    ON messages(match_id, read);

PRAGMA user_version = 1;
";
