use axum::extract::{Multipart, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::Path;
use crate::media_store::content_type_for;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Store the multipart field `file` and return the URL it is served from.
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or("").to_string();
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge(format!(
                    "Upload too large (max {} bytes)",
                    state.config.max_upload_size
                ))
            } else {
                ApiError::bad_request(format!("Failed to read field: {e}"))
            }
        })?;

        let name = state.media.store(&data, &content_type).await?;
        info!(name = %name, size = data.len(), by = %user.username, "media uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: state.media.url_for(&name),
            }),
        ));
    }

    Err(ApiError::invalid_field("file", "No file was submitted."))
}

pub async fn serve(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.media.open(&name).await?;
    Ok((
        [
            (CONTENT_TYPE, content_type_for(&name)),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        data,
    ))
}
