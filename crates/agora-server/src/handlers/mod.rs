//! HTTP endpoints.
//!
//! Each module pairs synchronous functions working on a borrowed
//! [`Database`](agora_store::Database) with thin async axum wrappers that lock
//! the shared handle, call them and shape the response.

pub mod accounts;
pub mod comments;
pub mod media;
pub mod posts;
pub mod profiles;
pub mod ratings;

use agora_shared::constants::MSG_POST_NOT_FOUND;
use agora_shared::PostRef;
use agora_store::{Database, Post, StoreError};

use crate::error::ApiError;

pub(crate) fn parse_post_ref(raw: &str) -> Result<PostRef, ApiError> {
    raw.parse::<PostRef>()
        .map_err(|_| ApiError::not_found(MSG_POST_NOT_FOUND))
}

/// Load a post, reporting absence with the catalog message.
pub(crate) fn load_post(db: &Database, post: PostRef) -> Result<Post, ApiError> {
    match db.get_post(post) {
        Ok(post) => Ok(post),
        Err(StoreError::NotFound) => Err(ApiError::not_found(MSG_POST_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}
