use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    pkid       INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,              -- UUID v4
    author_id  TEXT NOT NULL,                     -- FK -> users(id)
    title      TEXT NOT NULL,
    body       TEXT NOT NULL,
    image      TEXT NOT NULL,
    views      INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC);

CREATE TABLE IF NOT EXISTS post_tags (
    post_pkid INTEGER NOT NULL,                   -- FK -> posts(pkid)
    tag       TEXT NOT NULL,

    PRIMARY KEY (post_pkid, tag),
    FOREIGN KEY (post_pkid) REFERENCES posts(pkid) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag);

-- One row per (post, client ip). The unique index is what makes view
-- counting idempotent under concurrent requests.
CREATE TABLE IF NOT EXISTS post_views (
    pkid       INTEGER PRIMARY KEY AUTOINCREMENT,
    post_pkid  INTEGER NOT NULL,                  -- FK -> posts(pkid)
    ip         TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (post_pkid) REFERENCES posts(pkid) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_post_views_unique ON post_views(post_pkid, ip);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
