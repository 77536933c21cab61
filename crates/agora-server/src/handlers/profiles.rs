//! Profiles and the follow graph.

use axum::extract::State;
use axum::Json;
use tracing::info;
use validator::Validate;

use agora_shared::account::full_name;
use agora_shared::page::limit_offset;
use agora_shared::profile::{FollowEntry, FollowList, ProfileResponse, UpdateProfileRequest};
use agora_shared::{ErrorCode, MessageResponse, Page, PageQuery};
use agora_store::{Database, Profile, StoreError, User};

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::extract::{JsonBody, Path, Query};

pub fn profile_response(profile: Profile, following: bool) -> ProfileResponse {
    ProfileResponse {
        full_name: full_name(&profile.first_name, &profile.last_name),
        id: profile.id,
        username: profile.username,
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        profile_photo: profile.profile_photo,
        phone_number: profile.phone_number,
        about_me: profile.about_me,
        gender: profile.gender,
        country: profile.country,
        city: profile.city,
        twitter_handle: profile.twitter_handle,
        facebook_handle: profile.facebook_handle,
        instagram_handle: profile.instagram_handle,
        following,
    }
}

fn follow_entry(profile: Profile, following: bool) -> FollowEntry {
    FollowEntry {
        username: profile.username,
        first_name: profile.first_name,
        last_name: profile.last_name,
        profile_photo: profile.profile_photo,
        about_me: profile.about_me,
        twitter_handle: profile.twitter_handle,
        facebook_handle: profile.facebook_handle,
        instagram_handle: profile.instagram_handle,
        following,
    }
}

fn load_profile(db: &Database, username: &str) -> Result<Profile, ApiError> {
    match db.get_profile_by_username(username) {
        Ok(profile) => Ok(profile),
        Err(StoreError::NotFound) => Err(ApiError::not_found(format!(
            "A profile with username {username} does not exist."
        ))),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDirection {
    Following,
    Followers,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

pub fn list_profiles(
    db: &Database,
    config: &ServerConfig,
    requester: &User,
    query: PageQuery,
) -> Result<Page<ProfileResponse>, ApiError> {
    let (page, size) = query.resolve(config.page_size, config.max_page_size);
    let (limit, offset) = limit_offset(page, size);
    let me = db.get_profile_for_user(requester.id)?;

    let (profiles, count) = db.list_profiles(limit, offset)?;
    let mut results = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let following = db.is_following(me.id, profile.id)?;
        results.push(profile_response(profile, following));
    }
    Ok(Page::new(results, count, page, size))
}

pub fn profile_detail(db: &Database, requester: &User, username: &str) -> Result<ProfileResponse, ApiError> {
    let profile = load_profile(db, username)?;
    let me = db.get_profile_for_user(requester.id)?;
    let following = db.is_following(me.id, profile.id)?;
    Ok(profile_response(profile, following))
}

/// Owner-only partial update.
pub fn update_profile(
    db: &Database,
    requester: &User,
    username: &str,
    req: UpdateProfileRequest,
) -> Result<ProfileResponse, ApiError> {
    let profile = load_profile(db, username)?;
    if profile.user_id != requester.id {
        return Err(ApiError::forbidden("You can't edit a profile that doesn't belong to you!"));
    }
    req.validate()?;
    if req.is_empty() {
        return Ok(profile_response(profile, false));
    }
    let updated = db.update_profile(requester.id, &req)?;
    info!(username = %updated.username, "profile updated");
    Ok(profile_response(updated, false))
}

pub fn follow(db: &Database, requester: &User, username: &str) -> Result<MessageResponse, ApiError> {
    let target = load_profile(db, username)?;
    let me = db.get_profile_for_user(requester.id)?;
    if me.id == target.id {
        return Err(ApiError::Conflict(
            ErrorCode::CannotFollowSelf,
            "You can't follow yourself".to_string(),
        ));
    }
    if !db.follow(me.id, target.id)? {
        return Err(ApiError::Conflict(
            ErrorCode::AlreadyFollowing,
            format!("You are already following {}", target.username),
        ));
    }
    info!(follower = %me.username, followee = %target.username, "follow");
    Ok(MessageResponse::new(format!("You are now following {}", target.username)))
}

pub fn unfollow(db: &Database, requester: &User, username: &str) -> Result<MessageResponse, ApiError> {
    let target = load_profile(db, username)?;
    let me = db.get_profile_for_user(requester.id)?;
    if !db.unfollow(me.id, target.id)? {
        return Err(ApiError::Conflict(
            ErrorCode::NotFollowing,
            format!("You can't unfollow {}, since you were not following them in the first place", target.username),
        ));
    }
    info!(follower = %me.username, followee = %target.username, "unfollow");
    Ok(MessageResponse::new(format!("You have unfollowed {}", target.username)))
}

/// Either side of a profile's follow edges. Each entry's `following` flag
/// is relative to the requester.
pub fn follow_list(
    db: &Database,
    requester: &User,
    username: &str,
    direction: FollowDirection,
) -> Result<FollowList, ApiError> {
    let profile = load_profile(db, username)?;
    let me = db.get_profile_for_user(requester.id)?;
    let profiles = match direction {
        FollowDirection::Following => db.list_following(profile.id)?,
        FollowDirection::Followers => db.list_followers(profile.id)?,
    };

    let mut results = Vec::with_capacity(profiles.len());
    for entry in profiles {
        let following = db.is_following(me.id, entry.id)?;
        results.push(follow_entry(entry, following));
    }
    Ok(FollowList {
        username: profile.username,
        count: results.len(),
        results,
    })
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ProfileResponse>>, ApiError> {
    let db = state.db()?;
    Ok(Json(list_profiles(&db, &state.config, &user, query)?))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let db = state.db()?;
    let profile = db.get_profile_for_user(user.id)?;
    Ok(Json(profile_response(profile, false)))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let db = state.db()?;
    Ok(Json(profile_detail(&db, &user, &username)?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let db = state.db()?;
    Ok(Json(update_profile(&db, &user, &username, req)?))
}

pub async fn follow_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = state.db()?;
    Ok(Json(follow(&db, &user, &username)?))
}

pub async fn unfollow_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = state.db()?;
    Ok(Json(unfollow(&db, &user, &username)?))
}

pub async fn following(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<FollowList>, ApiError> {
    let db = state.db()?;
    Ok(Json(follow_list(&db, &user, &username, FollowDirection::Following)?))
}

pub async fn followers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<FollowList>, ApiError> {
    let db = state.db()?;
    Ok(Json(follow_list(&db, &user, &username, FollowDirection::Followers)?))
}
