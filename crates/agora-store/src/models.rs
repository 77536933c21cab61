//! Domain model structs persisted in the SQLite database.
//!
//! Rows that are always shown together with their owner (profiles with their
//! user, posts with their author's username) are loaded with a join so the
//! server never has to issue a second query to render them.

use agora_shared::types::{Gender, PostOrdering};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account. `password_hash` is an Argon2 PHC string and is never
/// serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub pkid: i64,
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`Database::create_user`](crate::Database::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Profile joined with the identity columns of its user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub pkid: i64,
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub about_me: String,
    pub gender: Gender,
    pub country: Option<String>,
    pub city: Option<String>,
    pub profile_photo: Option<String>,
    pub twitter_handle: Option<String>,
    pub facebook_handle: Option<String>,
    pub instagram_handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A post with its tags and engagement aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub pkid: i64,
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub title: String,
    pub body: String,
    pub image: String,
    pub tags: Vec<String>,
    pub views: i64,
    pub average_rating: f64,
    pub num_ratings: i64,
    pub num_comments: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub image: String,
    /// Already normalized (trimmed, lower-cased, de-duplicated).
    pub tags: Vec<String>,
}

/// Partial post update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Exact author username (case-insensitive).
    pub author: Option<String>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Exact tag.
    pub tag: Option<String>,
    pub ordering: PostOrdering,
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub pkid: i64,
    pub id: Uuid,
    pub post_pkid: i64,
    pub post_id: Uuid,
    pub rated_by: Uuid,
    pub value: i64,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub pkid: i64,
    pub id: Uuid,
    pub post_pkid: i64,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
