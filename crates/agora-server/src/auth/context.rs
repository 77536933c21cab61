use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use agora_shared::ErrorCode;
use agora_store::{StoreError, User};

use super::tokens::{token_not_valid, TokenKind};
use crate::api::AppState;
use crate::error::ApiError;

/// The authenticated requester, resolved from an `Authorization: Bearer`
/// access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn not_authenticated() -> ApiError {
    ApiError::Unauthorized(
        ErrorCode::NotAuthenticated,
        "Authentication credentials were not provided.".to_string(),
    )
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(not_authenticated)?
        .to_str()
        .map_err(|_| token_not_valid())?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(not_authenticated()),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token, TokenKind::Access)?;
        let user_id = claims.user_id()?;

        let user = {
            let db = state.db()?;
            match db.get_user(user_id) {
                Ok(user) => user,
                Err(StoreError::NotFound) => return Err(token_not_valid()),
                Err(e) => return Err(e.into()),
            }
        };
        if !user.is_active {
            return Err(token_not_valid());
        }
        Ok(CurrentUser(user))
    }
}
