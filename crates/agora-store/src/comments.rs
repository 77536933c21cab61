//! CRUD operations for [`Comment`] records.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Comment;
use crate::row::{get_ts, get_uuid, ts};

const COMMENT_SELECT: &str = "SELECT c.pkid, c.id, c.post_pkid, p.id, c.author_id, u.username,
            c.body, c.created_at, c.updated_at
     FROM comments c
     JOIN posts p ON p.pkid = c.post_pkid
     JOIN users u ON u.id = c.author_id";

impl Database {
    pub fn create_comment(&self, post_pkid: i64, author_id: Uuid, body: &str) -> Result<Comment> {
        let id = Uuid::new_v4();
        let now = ts(&Utc::now());
        self.conn().execute(
            "INSERT INTO comments (id, post_pkid, author_id, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id.to_string(), post_pkid, author_id.to_string(), body, now],
        )?;
        self.get_comment(id)
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Comment> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![id.to_string()], row_to_comment)?)
    }

    /// All comments on a post, oldest first. An empty vector is a valid
    /// answer, not an error.
    pub fn list_comments_for_post(&self, post_pkid: i64) -> Result<Vec<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.post_pkid = ?1 ORDER BY c.created_at ASC, c.pkid ASC");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![post_pkid], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    /// Partial update; `None` keeps the stored body but still bumps
    /// `updated_at`.
    pub fn update_comment(&self, id: Uuid, body: Option<&str>) -> Result<Comment> {
        let affected = self.conn().execute(
            "UPDATE comments SET body = COALESCE(?1, body), updated_at = ?2 WHERE id = ?3",
            params![body, ts(&Utc::now()), id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_comment(id)
    }

    /// Returns `true` if a row was deleted.
    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        pkid: row.get(0)?,
        id: get_uuid(row, 1)?,
        post_pkid: row.get(2)?,
        post_id: get_uuid(row, 3)?,
        author_id: get_uuid(row, 4)?,
        author_username: row.get(5)?,
        body: row.get(6)?,
        created_at: get_ts(row, 7)?,
        updated_at: get_ts(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::tests::new_post;
    use crate::users::tests::new_user;

    #[test]
    fn empty_post_lists_no_comments() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user(&new_user("a")).unwrap();
        let post = db.create_post(&new_post(a.id, "P", &[])).unwrap();
        assert!(db.list_comments_for_post(post.pkid).unwrap().is_empty());
    }

    #[test]
    fn comment_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user(&new_user("a")).unwrap();
        let b = db.create_user(&new_user("b")).unwrap();
        let post = db.create_post(&new_post(a.id, "P", &[])).unwrap();

        let c1 = db.create_comment(post.pkid, b.id, "first").unwrap();
        let c2 = db.create_comment(post.pkid, a.id, "second").unwrap();
        assert_eq!(c1.author_username, "b");
        assert_eq!(c1.post_id, post.id);

        let listed: Vec<_> = db
            .list_comments_for_post(post.pkid)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![c1.id, c2.id]);
        assert_eq!(db.get_post_by_pkid(post.pkid).unwrap().num_comments, 2);

        let edited = db.update_comment(c1.id, Some("edited")).unwrap();
        assert_eq!(edited.body, "edited");
        assert_eq!(db.update_comment(c1.id, None).unwrap().body, "edited");

        assert!(db.delete_comment(c1.id).unwrap());
        assert!(!db.delete_comment(c1.id).unwrap());
        assert!(matches!(db.get_comment(c1.id), Err(StoreError::NotFound)));
        assert!(matches!(
            db.update_comment(c1.id, Some("x")),
            Err(StoreError::NotFound)
        ));
    }
}
