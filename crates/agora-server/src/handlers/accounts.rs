//! Registration, token issuance, the current user and password reset.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tracing::{info, warn};
use uuid::Uuid;

use agora_shared::account::{
    full_name, title_case, AccessToken, PasswordResetConfirm, PasswordResetRequest, RefreshRequest,
    RegisterRequest, TokenPair, TokenRequest, UserResponse,
};
use agora_shared::constants::{MSG_NO_ACTIVE_ACCOUNT, MSG_PASSWORD_RESET_DONE, MSG_PASSWORD_RESET_SENT};
use agora_shared::{ErrorCode, MessageResponse};
use agora_store::{Database, NewUser, Profile, StoreError, User};

use crate::api::AppState;
use crate::auth::password::password_stamp;
use crate::auth::tokens::token_not_valid;
use crate::auth::{hash_password, verify_password, Claims, CurrentUser, TokenKind};
use crate::error::ApiError;
use crate::extract::ValidJson;

pub fn user_response(user: &User, profile: &Profile) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: title_case(&user.first_name),
        last_name: title_case(&user.last_name),
        full_name: full_name(&user.first_name, &user.last_name),
        gender: profile.gender,
        phone_number: profile.phone_number.clone(),
        profile_photo: profile.profile_photo.clone(),
        country: profile.country.clone(),
        city: profile.city.clone(),
        admin: user.is_superuser.then_some(true),
    }
}

fn no_active_account() -> ApiError {
    ApiError::Unauthorized(ErrorCode::NoActiveAccount, MSG_NO_ACTIVE_ACCOUNT.to_string())
}

fn user_does_not_exist() -> ApiError {
    ApiError::invalid_field("uidb64", "User does not exist")
}

/// URL-safe base64 of the user's UUID string, as carried in reset links.
pub fn encode_uid(id: Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(uidb64: &str) -> Option<Uuid> {
    let bytes = URL_SAFE_NO_PAD
        .decode(uidb64.trim().trim_end_matches('='))
        .ok()?;
    let text = String::from_utf8(bytes).ok()?;
    Uuid::parse_str(&text).ok()
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Insert the account and its profile. `password_hash` is computed by the
/// caller so the database lock is not held while hashing.
pub fn register_user(db: &Database, req: &RegisterRequest, password_hash: String) -> Result<User, ApiError> {
    let user = db.create_user(&NewUser {
        username: req.username.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        password_hash,
        is_superuser: false,
    })?;
    info!(user = %user.id, username = %user.username, "account registered");
    Ok(user)
}

/// Check a looked-up account against the submitted password. Unknown,
/// inactive and wrong-password cases are indistinguishable to the caller.
pub fn check_credentials(lookup: Result<User, StoreError>, password: &str) -> Result<User, ApiError> {
    let user = match lookup {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(no_active_account()),
        Err(e) => return Err(e.into()),
    };
    if !user.is_active || !verify_password(password, &user.password_hash) {
        return Err(no_active_account());
    }
    Ok(user)
}

/// An account that a token may still act for.
pub fn active_user(db: &Database, claims: &Claims) -> Result<User, ApiError> {
    match db.get_user(claims.user_id()?) {
        Ok(user) if user.is_active => Ok(user),
        Ok(_) | Err(StoreError::NotFound) => Err(token_not_valid()),
        Err(e) => Err(e.into()),
    }
}

/// Resolve the account a reset confirmation targets.
pub fn reset_target(db: &Database, uidb64: &str) -> Result<User, ApiError> {
    let id = decode_uid(uidb64).ok_or_else(user_does_not_exist)?;
    match db.get_user(id) {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound) => Err(user_does_not_exist()),
        Err(e) => Err(e.into()),
    }
}

/// A reset token is bound to one account and to the password it had when
/// the token was issued.
pub fn check_reset_claims(claims: &Claims, user: &User) -> Result<(), ApiError> {
    let current = password_stamp(&user.password_hash);
    if claims.user_id()? != user.id || claims.stamp.as_deref() != Some(current) {
        return Err(token_not_valid());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let password_hash = hash_password(&req.password)?;
    let db = state.db()?;
    let user = register_user(&db, &req, password_hash)?;
    let profile = db.get_profile_for_user(user.id)?;
    Ok((StatusCode::CREATED, Json(user_response(&user, &profile))))
}

pub async fn obtain_token(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let lookup = {
        let db = state.db()?;
        db.get_user_by_email(&req.email)
    };
    let user = check_credentials(lookup, &req.password)?;
    Ok(Json(state.tokens.issue_pair(&user)?))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let claims = state.tokens.verify(&req.refresh, TokenKind::Refresh)?;
    let user = {
        let db = state.db()?;
        active_user(&db, &claims)?
    };
    let access = state.tokens.issue(user.id, &user.email, TokenKind::Access)?;
    Ok(Json(AccessToken { access }))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let db = state.db()?;
    let profile = db.get_profile_for_user(user.id)?;
    Ok(Json(user_response(&user, &profile)))
}

/// Always answers the same way so the endpoint cannot be used to discover
/// registered addresses.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let lookup = {
        let db = state.db()?;
        db.get_user_by_email(&req.email)
    };
    match lookup {
        Ok(user) if user.is_active => {
            let token = state.tokens.issue_reset(&user)?;
            let uidb64 = encode_uid(user.id);
            info!(
                target: "agora_server::outbox",
                to = %user.email,
                uidb64 = %uidb64,
                token = %token,
                "password reset link"
            );
        }
        Ok(_) | Err(StoreError::NotFound) => {
            warn!(email = %req.email, "password reset requested for unknown or inactive account");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Json(MessageResponse::new(MSG_PASSWORD_RESET_SENT)))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<PasswordResetConfirm>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = {
        let db = state.db()?;
        reset_target(&db, &req.uidb64)?
    };
    let claims = state.tokens.verify(&req.token, TokenKind::Reset)?;
    check_reset_claims(&claims, &user)?;

    let password_hash = hash_password(&req.password)?;
    let replaced = {
        let db = state.db()?;
        db.replace_password_hash(user.id, &user.password_hash, &password_hash)?
    };
    if !replaced {
        return Err(token_not_valid());
    }
    info!(user = %user.id, "password reset completed");
    Ok(Json(MessageResponse::new(MSG_PASSWORD_RESET_DONE)))
}
