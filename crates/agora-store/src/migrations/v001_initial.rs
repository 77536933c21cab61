//! v001 -- Initial schema creation.
//!
//! Creates the identity tables: `users`, `profiles` and `follows`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    pkid          INTEGER PRIMARY KEY AUTOINCREMENT,
    id            TEXT NOT NULL UNIQUE,               -- UUID v4
    username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    password_hash TEXT NOT NULL,                      -- Argon2 PHC string
    is_active     INTEGER NOT NULL DEFAULT 1,         -- boolean 0/1
    is_superuser  INTEGER NOT NULL DEFAULT 0,         -- boolean 0/1
    created_at    TEXT NOT NULL,                      -- RFC-3339, UTC
    updated_at    TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Profiles (one per user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS profiles (
    pkid             INTEGER PRIMARY KEY AUTOINCREMENT,
    id               TEXT NOT NULL UNIQUE,            -- UUID v4
    user_id          TEXT NOT NULL UNIQUE,            -- FK -> users(id)
    phone_number     TEXT,
    about_me         TEXT NOT NULL DEFAULT 'say something about yourself',
    gender           TEXT NOT NULL DEFAULT 'other',
    country          TEXT,
    city             TEXT,
    profile_photo    TEXT,
    twitter_handle   TEXT,
    facebook_handle  TEXT,
    instagram_handle TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Follows (directed edge follower -> followee, between profiles)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL,                        -- FK -> profiles(id)
    followee_id TEXT NOT NULL,                        -- FK -> profiles(id)
    created_at  TEXT NOT NULL,

    PRIMARY KEY (follower_id, followee_id),
    CHECK (follower_id <> followee_id),
    FOREIGN KEY (follower_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (followee_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
