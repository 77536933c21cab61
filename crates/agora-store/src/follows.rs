//! The follow graph: directed edges between profiles.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::Profile;
use crate::profiles::{row_to_profile, PROFILE_SELECT};
use crate::row::ts;

impl Database {
    /// Add the edge `follower -> followee`. Returns `false` if it already
    /// existed.
    pub fn follow(&self, follower: Uuid, followee: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT INTO follows (follower_id, followee_id, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (follower_id, followee_id) DO NOTHING",
            params![follower.to_string(), followee.to_string(), ts(&Utc::now())],
        )?;
        Ok(affected == 1)
    }

    /// Remove the edge `follower -> followee`. Returns `false` if there was
    /// none.
    pub fn unfollow(&self, follower: Uuid, followee: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            params![follower.to_string(), followee.to_string()],
        )?;
        Ok(affected > 0)
    }

    pub fn is_following(&self, follower: Uuid, followee: Uuid) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2)",
            params![follower.to_string(), followee.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Profiles that `profile_id` follows, most recent edge first.
    pub fn list_following(&self, profile_id: Uuid) -> Result<Vec<Profile>> {
        self.follow_listing(
            "JOIN follows f ON f.followee_id = p.id WHERE f.follower_id = ?1",
            profile_id,
        )
    }

    /// Profiles following `profile_id`, most recent edge first.
    pub fn list_followers(&self, profile_id: Uuid) -> Result<Vec<Profile>> {
        self.follow_listing(
            "JOIN follows f ON f.follower_id = p.id WHERE f.followee_id = ?1",
            profile_id,
        )
    }

    fn follow_listing(&self, join: &str, profile_id: Uuid) -> Result<Vec<Profile>> {
        let sql = format!("{PROFILE_SELECT} {join} ORDER BY f.created_at DESC, p.pkid DESC");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![profile_id.to_string()], row_to_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::tests::new_user;

    fn profile_of(db: &Database, name: &str) -> Uuid {
        let user = db.create_user(&new_user(name)).unwrap();
        db.get_profile_for_user(user.id).unwrap().id
    }

    #[test]
    fn follow_is_directed_and_queryable_both_ways() {
        let db = Database::open_in_memory().unwrap();
        let a = profile_of(&db, "a");
        let b = profile_of(&db, "b");

        assert!(db.follow(a, b).unwrap());
        assert!(db.is_following(a, b).unwrap());
        assert!(!db.is_following(b, a).unwrap());

        let following: Vec<_> = db.list_following(a).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(following, vec![b]);
        let followers: Vec<_> = db.list_followers(b).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(followers, vec![a]);
        assert!(db.list_followers(a).unwrap().is_empty());
    }

    #[test]
    fn duplicate_follow_and_missing_unfollow() {
        let db = Database::open_in_memory().unwrap();
        let a = profile_of(&db, "a");
        let b = profile_of(&db, "b");

        assert!(db.follow(a, b).unwrap());
        assert!(!db.follow(a, b).unwrap());
        assert!(db.unfollow(a, b).unwrap());
        assert!(!db.unfollow(a, b).unwrap());
        assert!(!db.is_following(a, b).unwrap());
    }

    #[test]
    fn self_follow_violates_check() {
        let db = Database::open_in_memory().unwrap();
        let a = profile_of(&db, "a");
        assert!(db.follow(a, a).is_err());
    }
}
