//! The single error envelope returned by every endpoint.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field name -> list of human-readable problems with that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Machine-distinguishable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    PermissionDenied,
    AlreadyRated,
    CannotRateOwnPost,
    AlreadyFollowing,
    NotFollowing,
    CannotFollowSelf,
    DuplicateAccount,
    NotAuthenticated,
    TokenNotValid,
    NoActiveAccount,
    PayloadTooLarge,
    Throttled,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::AlreadyRated => "already_rated",
            ErrorCode::CannotRateOwnPost => "cannot_rate_own_post",
            ErrorCode::AlreadyFollowing => "already_following",
            ErrorCode::NotFollowing => "not_following",
            ErrorCode::CannotFollowSelf => "cannot_follow_self",
            ErrorCode::DuplicateAccount => "duplicate_account",
            ErrorCode::NotAuthenticated => "not_authenticated",
            ErrorCode::TokenNotValid => "token_not_valid",
            ErrorCode::NoActiveAccount => "no_active_account",
            ErrorCode::PayloadTooLarge => "payload_too_large",
            ErrorCode::Throttled => "throttled",
            ErrorCode::ServerError => "server_error",
        }
    }

    /// HTTP status code conventionally paired with this error code.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError => 400,
            ErrorCode::PermissionDenied => 403,
            ErrorCode::AlreadyRated
            | ErrorCode::CannotRateOwnPost
            | ErrorCode::AlreadyFollowing
            | ErrorCode::NotFollowing
            | ErrorCode::CannotFollowSelf
            | ErrorCode::DuplicateAccount => 409,
            ErrorCode::NotAuthenticated | ErrorCode::TokenNotValid | ErrorCode::NoActiveAccount => {
                401
            }
            ErrorCode::PayloadTooLarge => 413,
            ErrorCode::Throttled => 429,
            ErrorCode::ServerError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"status_code": .., "code": .., "message": .., "errors": ..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub code: ErrorCode,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.status_code(),
            code,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        if !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_snake_case_code() {
        let body = ErrorBody::new(ErrorCode::AlreadyRated, "You have already rated this post");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "already_rated");
        assert_eq!(json["status_code"], 409);
        assert!(json["errors"].is_null());
    }

    #[test]
    fn as_str_matches_serde_name() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::CannotRateOwnPost,
            ErrorCode::NoActiveAccount,
            ErrorCode::ServerError,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }

    #[test]
    fn empty_field_errors_are_omitted() {
        let body = ErrorBody::new(ErrorCode::ValidationError, "bad").with_errors(FieldErrors::new());
        assert!(body.errors.is_none());
    }
}
