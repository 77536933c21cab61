//! CRUD operations for [`User`] records.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, User};
use crate::row::{get_ts, get_uuid, ts};

const USER_COLUMNS: &str = "pkid, id, username, email, first_name, last_name, password_hash,
     is_active, is_superuser, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user together with an empty profile, atomically.
    ///
    /// A clash on username or email is reported as [`StoreError::Duplicate`].
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO users (id, username, email, first_name, last_name, password_hash,
                                is_active, is_superuser, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?8)",
            params![
                id.to_string(),
                new.username,
                new.email,
                new.first_name,
                new.last_name,
                new.password_hash,
                new.is_superuser,
                ts(&now),
            ],
        )?;
        tx.execute(
            "INSERT INTO profiles (id, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![Uuid::new_v4().to_string(), id.to_string(), ts(&now)],
        )?;
        tx.commit()?;

        tracing::debug!(user_id = %id, username = %new.username, "user created");

        self.get_user(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.user_where("id = ?1", &id.to_string())
    }

    /// Case-insensitive lookup by email.
    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.user_where("email = ?1", email.trim())
    }

    /// Case-insensitive lookup by username.
    pub fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.user_where("username = ?1", username)
    }

    fn user_where(&self, predicate: &str, value: &str) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
        Ok(self.conn().query_row(&sql, params![value], row_to_user)?)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace a user's password hash, but only while the stored hash is
    /// still `current`. Returns `false` when it has changed in the meantime
    /// or the user does not exist.
    pub fn replace_password_hash(&self, id: Uuid, current: &str, password_hash: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2
             WHERE id = ?3 AND password_hash = ?4",
            params![password_hash, ts(&Utc::now()), id.to_string(), current],
        )?;
        Ok(affected == 1)
    }

    pub fn set_user_active(&self, id: Uuid, active: bool) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, ts(&Utc::now()), id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        pkid: row.get(0)?,
        id: get_uuid(row, 1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        password_hash: row.get(6)?,
        is_active: row.get(7)?,
        is_superuser: row.get(8)?,
        created_at: get_ts(row, 9)?,
        updated_at: get_ts(row, 10)?,
    })
}
