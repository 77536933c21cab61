//! Post payloads and the post list query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::PostOrdering;
use crate::validation::{validate_not_blank, validate_tags};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    /// Defaults to the requesting user when omitted.
    #[serde(default)]
    pub author: Option<Uuid>,
    #[validate(length(min = 1, max = 250), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1), custom(function = "validate_not_blank"))]
    pub body: String,
    #[serde(alias = "post_image")]
    #[validate(length(min = 1, max = 500))]
    pub image: String,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 250), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1), custom(function = "validate_not_blank"))]
    pub body: Option<String>,
    #[serde(default, alias = "post_image")]
    #[validate(length(min = 1, max = 500))]
    pub image: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub pkid: i64,
    pub author: String,
    pub author_id: Uuid,
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

/// Filters accepted by `GET /posts/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListQuery {
    pub author: Option<String>,
    pub title: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub ordering: PostOrdering,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
