//! CRUD operations for [`Post`] records, their tags and view records.

use agora_shared::types::PostRef;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewPost, Post, PostChanges, PostFilter};
use crate::row::{get_ts, get_uuid, ts};

const POST_SELECT: &str = "SELECT p.pkid, p.id, p.author_id, u.username, p.title, p.body,
            p.image, p.views,
            COALESCE((SELECT AVG(r.value) FROM ratings r WHERE r.post_pkid = p.pkid), 0.0),
            (SELECT COUNT(*) FROM ratings r WHERE r.post_pkid = p.pkid),
            (SELECT COUNT(*) FROM comments c WHERE c.post_pkid = p.pkid),
            p.created_at, p.updated_at
     FROM posts p
     JOIN users u ON u.id = p.author_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn create_post(&self, new: &NewPost) -> Result<Post> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO posts (id, author_id, title, body, image, views, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)",
            params![
                id.to_string(),
                new.author_id.to_string(),
                new.title,
                new.body,
                new.image,
                ts(&now),
            ],
        )?;
        let pkid = tx.last_insert_rowid();
        insert_tags(&tx, pkid, &new.tags)?;
        tx.commit()?;

        self.get_post_by_pkid(pkid)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_post(&self, post: PostRef) -> Result<Post> {
        match post {
            PostRef::Pkid(pkid) => self.get_post_by_pkid(pkid),
            PostRef::Id(id) => self.get_post_by_id(id),
        }
    }

    pub fn get_post_by_pkid(&self, pkid: i64) -> Result<Post> {
        let sql = format!("{POST_SELECT} WHERE p.pkid = ?1");
        let mut post = self.conn().query_row(&sql, params![pkid], row_to_post)?;
        post.tags = self.tags_for_post(post.pkid)?;
        Ok(post)
    }

    pub fn get_post_by_id(&self, id: Uuid) -> Result<Post> {
        let sql = format!("{POST_SELECT} WHERE p.id = ?1");
        let mut post = self
            .conn()
            .query_row(&sql, params![id.to_string()], row_to_post)?;
        post.tags = self.tags_for_post(post.pkid)?;
        Ok(post)
    }

    /// One page of posts matching `filter`, plus the total match count.
    pub fn list_posts(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, u64)> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(author) = filter.author.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clauses.push("u.username = ?");
            values.push(author.to_string());
        }
        if let Some(title) = filter.title.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clauses.push("p.title LIKE ? ESCAPE '\\'");
            values.push(format!("%{}%", escape_like(title)));
        }
        if let Some(tag) = filter.tag.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clauses.push(
                "EXISTS (SELECT 1 FROM post_tags t WHERE t.post_pkid = p.pkid AND t.tag = ?)",
            );
            values.push(tag.to_lowercase());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let total: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM posts p JOIN users u ON u.id = p.author_id {where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{POST_SELECT} {where_sql} ORDER BY {} LIMIT {} OFFSET {}",
            filter.ordering.sql(),
            limit.max(0),
            offset.max(0),
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        for post in &mut posts {
            post.tags = self.tags_for_post(post.pkid)?;
        }
        Ok((posts, total.max(0) as u64))
    }

    pub fn tags_for_post(&self, pkid: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT tag FROM post_tags WHERE post_pkid = ?1 ORDER BY tag ASC")?;
        let rows = stmt.query_map(params![pkid], |row| row.get::<_, String>(0))?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update. Replaces the whole tag set when `tags` is
    /// present.
    pub fn update_post(&self, pkid: i64, changes: &PostChanges) -> Result<Post> {
        let tx = self.conn().unchecked_transaction()?;
        let affected = tx.execute(
            "UPDATE posts SET
                title      = COALESCE(?1, title),
                body       = COALESCE(?2, body),
                image      = COALESCE(?3, image),
                updated_at = ?4
             WHERE pkid = ?5",
            params![changes.title, changes.body, changes.image, ts(&Utc::now()), pkid],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        if let Some(tags) = &changes.tags {
            tx.execute("DELETE FROM post_tags WHERE post_pkid = ?1", params![pkid])?;
            insert_tags(&tx, pkid, tags)?;
        }
        tx.commit()?;

        self.get_post_by_pkid(pkid)
    }

    /// Record that `ip` viewed the post, bumping the view counter only the
    /// first time this (post, ip) pair is seen. Returns whether the counter
    /// moved.
    ///
    /// The unique index on `post_views(post_pkid, ip)` decides the race: of
    /// two concurrent first views from the same address exactly one insert
    /// takes effect, and only that one increments.
    pub fn record_post_view(&self, pkid: i64, ip: &str) -> Result<bool> {
        let tx = self.conn().unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO post_views (post_pkid, ip, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (post_pkid, ip) DO NOTHING",
            params![pkid, ip, ts(&Utc::now())],
        )?;
        if inserted == 1 {
            tx.execute(
                "UPDATE posts SET views = views + 1 WHERE pkid = ?1",
                params![pkid],
            )?;
        }
        tx.commit()?;
        Ok(inserted == 1)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a post and, by cascade, its tags, views, ratings and comments.
    /// Returns `true` if a row was deleted.
    pub fn delete_post(&self, pkid: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM posts WHERE pkid = ?1", params![pkid])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_tags(conn: &Connection, pkid: i64, tags: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO post_tags (post_pkid, tag) VALUES (?1, ?2)
         ON CONFLICT (post_pkid, tag) DO NOTHING",
    )?;
    for tag in tags {
        stmt.execute(params![pkid, tag])?;
    }
    Ok(())
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Map a row of [`POST_SELECT`] to a [`Post`]. Tags are filled in by the
/// caller.
fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        pkid: row.get(0)?,
        id: get_uuid(row, 1)?,
        author_id: get_uuid(row, 2)?,
        author_username: row.get(3)?,
        title: row.get(4)?,
        body: row.get(5)?,
        image: row.get(6)?,
        tags: Vec::new(),
        views: row.get(7)?,
        average_rating: row.get(8)?,
        num_ratings: row.get(9)?,
        num_comments: row.get(10)?,
        created_at: get_ts(row, 11)?,
        updated_at: get_ts(row, 12)?,
    })
}
