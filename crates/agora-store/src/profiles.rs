//! Read and update operations for [`Profile`] records.
//!
//! Profiles are created by [`Database::create_user`] and never deleted on
//! their own.

use agora_shared::profile::UpdateProfileRequest;
use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Profile;
use crate::row::{get_parsed, get_ts, get_uuid, ts};

pub(crate) const PROFILE_SELECT: &str = "SELECT p.pkid, p.id, p.user_id, u.username, u.email,
            u.first_name, u.last_name, p.phone_number, p.about_me, p.gender, p.country,
            p.city, p.profile_photo, p.twitter_handle, p.facebook_handle,
            p.instagram_handle, p.created_at, p.updated_at
     FROM profiles p
     JOIN users u ON u.id = p.user_id";

impl Database {
    pub fn get_profile_for_user(&self, user_id: Uuid) -> Result<Profile> {
        let sql = format!("{PROFILE_SELECT} WHERE p.user_id = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![user_id.to_string()], row_to_profile)?)
    }

    /// Case-insensitive lookup by the owning user's username.
    pub fn get_profile_by_username(&self, username: &str) -> Result<Profile> {
        let sql = format!("{PROFILE_SELECT} WHERE u.username = ?1");
        Ok(self.conn().query_row(&sql, params![username], row_to_profile)?)
    }

    /// One page of active users' profiles, newest first, plus the total count.
    pub fn list_profiles(&self, limit: i64, offset: i64) -> Result<(Vec<Profile>, u64)> {
        let total: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM profiles p JOIN users u ON u.id = p.user_id
             WHERE u.is_active = 1",
            [],
            |row| row.get(0),
        )?;

        let sql = format!(
            "{PROFILE_SELECT} WHERE u.is_active = 1
             ORDER BY p.created_at DESC, p.pkid DESC
             LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![limit, offset], row_to_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok((profiles, total.max(0) as u64))
    }

    /// Apply a partial update to the profile owned by `user_id`.
    pub fn update_profile(&self, user_id: Uuid, changes: &UpdateProfileRequest) -> Result<Profile> {
        let affected = self.conn().execute(
            "UPDATE profiles SET
                phone_number     = COALESCE(?1, phone_number),
                profile_photo    = COALESCE(?2, profile_photo),
                about_me         = COALESCE(?3, about_me),
                gender           = COALESCE(?4, gender),
                country          = COALESCE(?5, country),
                city             = COALESCE(?6, city),
                twitter_handle   = COALESCE(?7, twitter_handle),
                facebook_handle  = COALESCE(?8, facebook_handle),
                instagram_handle = COALESCE(?9, instagram_handle),
                updated_at       = ?10
             WHERE user_id = ?11",
            params![
                changes.phone_number,
                changes.profile_photo,
                changes.about_me,
                changes.gender.map(|g| g.as_str()),
                changes.country,
                changes.city,
                changes.twitter_handle,
                changes.facebook_handle,
                changes.instagram_handle,
                ts(&Utc::now()),
                user_id.to_string(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_profile_for_user(user_id)
    }
}

pub(crate) fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        pkid: row.get(0)?,
        id: get_uuid(row, 1)?,
        user_id: get_uuid(row, 2)?,
        username: row.get(3)?,
        email: row.get(4)?,
        first_name: row.get(5)?,
        last_name: row.get(6)?,
        phone_number: row.get(7)?,
        about_me: row.get(8)?,
        gender: get_parsed(row, 9)?,
        country: row.get(10)?,
        city: row.get(11)?,
        profile_photo: row.get(12)?,
        twitter_handle: row.get(13)?,
        facebook_handle: row.get(14)?,
        instagram_handle: row.get(15)?,
        created_at: get_ts(row, 16)?,
        updated_at: get_ts(row, 17)?,
    })
}
