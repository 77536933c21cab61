//! Rating and comment payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::constants::{MAX_RATING, MIN_RATING};
use crate::validation::validate_not_blank;

/// Body of `POST /posts/{id}/ratings/`.
///
/// Presence and range of `value` are checked by the rating handler after the
/// ownership and duplicate checks, so neither is part of the derive rules.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RatingRequest {
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub review: String,
}

impl RatingRequest {
    pub fn value_in_range(value: i64) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&value)
    }
}

/// Body for creating or updating a comment. Any client-supplied `post` or
/// `author` keys are ignored; the server fills those in.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 1000), custom(function = "validate_not_blank"))]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 1000), custom(function = "validate_not_blank"))]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post: Uuid,
    pub author: Uuid,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentList {
    pub comments: Vec<CommentResponse>,
    pub num_comments: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_out_of_range() {
        assert!(!RatingRequest::value_in_range(0));
        assert!(RatingRequest::value_in_range(5));
        let r = RatingRequest {
            value: Some(0),
            review: String::new(),
        };
        assert!(r.validate().is_ok());
    }

    #[test]
    fn missing_value_deserializes() {
        let r: RatingRequest = serde_json::from_str(r#"{"review": "x"}"#).unwrap();
        assert_eq!(r.value, None);
    }

    #[test]
    fn comment_ignores_injected_fields() {
        let req: CommentRequest = serde_json::from_str(
            r#"{"body": "nice", "author": "00000000-0000-0000-0000-000000000000", "post": 7}"#,
        )
        .unwrap();
        assert_eq!(req.body, "nice");
    }
}
