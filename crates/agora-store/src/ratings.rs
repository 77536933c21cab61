use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::Rating;
use crate::row::{get_ts, get_uuid, ts};

const RATING_SELECT: &str = "SELECT r.pkid, r.id, r.post_pkid, p.id, r.rated_by, r.value,
            r.review, r.created_at
     FROM ratings r
     JOIN posts p ON p.pkid = r.post_pkid";

impl Database {
    /// Insert a rating unless `rated_by` already rated this post.
    ///
    /// Returns `None` when the unique `(post_pkid, rated_by)` index rejected
    /// the row, which is the authoritative duplicate signal.
    pub fn insert_rating(
        &self,
        post_pkid: i64,
        rated_by: Uuid,
        value: i64,
        review: &str,
    ) -> Result<Option<Rating>> {
        let id = Uuid::new_v4();
        let inserted = self.conn().execute(
            "INSERT INTO ratings (id, post_pkid, rated_by, value, review, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (post_pkid, rated_by) DO NOTHING",
            params![
                id.to_string(),
                post_pkid,
                rated_by.to_string(),
                value,
                review,
                ts(&Utc::now()),
            ],
        )?;
        if inserted == 0 {
            return Ok(None);
        }

        let sql = format!("{RATING_SELECT} WHERE r.id = ?1");
        let rating = self
            .conn()
            .query_row(&sql, params![id.to_string()], row_to_rating)?;
        Ok(Some(rating))
    }

    pub fn has_rated(&self, post_pkid: i64, user_id: Uuid) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM ratings WHERE post_pkid = ?1 AND rated_by = ?2)",
            params![post_pkid, user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn list_ratings_for_post(&self, post_pkid: i64) -> Result<Vec<Rating>> {
        let sql = format!("{RATING_SELECT} WHERE r.post_pkid = ?1 ORDER BY r.created_at ASC, r.pkid ASC");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![post_pkid], row_to_rating)?;

        let mut ratings = Vec::new();
        for row in rows {
            ratings.push(row?);
        }
        Ok(ratings)
    }
}

fn row_to_rating(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rating> {
    Ok(Rating {
        pkid: row.get(0)?,
        id: get_uuid(row, 1)?,
        post_pkid: row.get(2)?,
        post_id: get_uuid(row, 3)?,
        rated_by: get_uuid(row, 4)?,
        value: row.get(5)?,
        review: row.get(6)?,
        created_at: get_ts(row, 7)?,
    })
}
