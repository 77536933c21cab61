use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS ratings (
    pkid       INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,              -- UUID v4
    post_pkid  INTEGER NOT NULL,                  -- FK -> posts(pkid)
    rated_by   TEXT NOT NULL,                     -- FK -> users(id)
    value      INTEGER NOT NULL CHECK (value <> 0),
    review     TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,

    FOREIGN KEY (post_pkid) REFERENCES posts(pkid) ON DELETE CASCADE,
    FOREIGN KEY (rated_by) REFERENCES users(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_ratings_unique ON ratings(post_pkid, rated_by);

CREATE TABLE IF NOT EXISTS comments (
    pkid       INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,              -- UUID v4
    post_pkid  INTEGER NOT NULL,                  -- FK -> posts(pkid)
    author_id  TEXT NOT NULL,                     -- FK -> users(id)
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY (post_pkid) REFERENCES posts(pkid) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_pkid, created_at);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
