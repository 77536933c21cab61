use agora_shared::validation::field_errors;
use agora_shared::{ErrorBody, ErrorCode, FieldErrors};
use agora_store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        errors: FieldErrors,
    },

    #[error("{0}")]
    PermissionDenied(String),

    /// A domain rule was violated (already rated, self-rating, ...).
    #[error("{1}")]
    Conflict(ErrorCode, String),

    /// Missing, malformed or expired credentials.
    #[error("{1}")]
    Unauthorized(ErrorCode, String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Request was throttled")]
    Throttled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Validation failure without per-field detail.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    /// Validation failure attributed to a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.clone()]);
        ApiError::Validation { message, errors }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::PermissionDenied(message.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        ApiError::Internal(e.to_string())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Validation { .. } => ErrorCode::ValidationError,
            ApiError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            ApiError::Conflict(code, _) | ApiError::Unauthorized(code, _) => *code,
            ApiError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            ApiError::Throttled => ErrorCode::Throttled,
            ApiError::Internal(_) => ErrorCode::ServerError,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation { message, errors } => {
                ErrorBody::new(ErrorCode::ValidationError, message.clone())
                    .with_errors(errors.clone())
            }
            ApiError::Internal(_) => {
                ErrorBody::new(ErrorCode::ServerError, "Internal server error")
            }
            other => ErrorBody::new(other.code(), other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }

        let body = self.body();
        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Not found.".to_string()),
            StoreError::Duplicate(column) if column.starts_with("users.") => {
                let field = column.trim_start_matches("users.");
                ApiError::Conflict(
                    ErrorCode::DuplicateAccount,
                    format!("A user with that {field} already exists."),
                )
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let errors = field_errors(&e);
        let message = match errors.keys().next() {
            Some(field) => format!("Invalid value for '{field}'"),
            None => "Invalid request".to_string(),
        };
        ApiError::Validation { message, errors }
    }
}
