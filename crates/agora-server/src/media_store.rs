use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

/// Image types accepted for upload, keyed by content type.
const ALLOWED_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ApiError> {
    // Canonicalize base; target may not exist yet so normalize manually
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(base)
        .unwrap_or(target)
        .components()
    {
        match component {
            std::path::Component::Normal(c) => resolved.push(c),
            std::path::Component::ParentDir => {
                return Err(ApiError::bad_request("Path traversal detected"));
            }
            _ => {} // RootDir, CurDir, Prefix
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ApiError::bad_request("Path traversal detected"));
    }
    Ok(resolved)
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    ALLOWED_TYPES
        .iter()
        .find(|(ct, _)| ct.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

pub fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("");
    ALLOWED_TYPES
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(ct, _)| *ct)
        .unwrap_or("application/octet-stream")
}

/// Uploaded images (post images, profile photos) on local disk.
#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    base_url: String,
    max_size: usize,
}

impl MediaStore {
    pub async fn new(base_path: PathBuf, base_url: String, max_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ApiError::Internal(format!(
                "Failed to create media directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), url = %base_url, "Media store initialized");

        Ok(Self {
            base_path,
            base_url,
            max_size,
        })
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Store an image and return its generated file name.
    pub async fn store(&self, data: &[u8], content_type: &str) -> Result<String, ApiError> {
        if data.is_empty() {
            return Err(ApiError::invalid_field("file", "The submitted file is empty."));
        }
        if data.len() > self.max_size {
            return Err(ApiError::PayloadTooLarge(format!(
                "Upload too large: {} bytes (max {})",
                data.len(),
                self.max_size
            )));
        }
        let ext = extension_for(content_type).ok_or_else(|| {
            ApiError::invalid_field(
                "file",
                "Upload a valid image. Supported types: png, jpeg, gif, webp.",
            )
        })?;

        let name = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.safe_path(&name)?;

        fs::write(&path, data)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to write media {name}: {e}")))?;

        debug!(name = %name, size = data.len(), "Stored media");
        Ok(name)
    }

    pub async fn open(&self, name: &str) -> Result<Vec<u8>, ApiError> {
        let path = self.safe_path(name)?;

        if !path.exists() {
            return Err(ApiError::not_found("File not found."));
        }

        let data = fs::read(&path)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to read media {name}: {e}")))?;

        debug!(name = %name, size = data.len(), "Served media");
        Ok(data)
    }

    /// Only names this store generated (`<uuid>.<ext>`) are accepted.
    fn safe_path(&self, name: &str) -> Result<PathBuf, ApiError> {
        let valid = match name.split_once('.') {
            Some((stem, ext)) => {
                Uuid::parse_str(stem).is_ok() && ALLOWED_TYPES.iter().any(|(_, e)| *e == ext)
            }
            None => false,
        };
        if !valid {
            return Err(ApiError::not_found("File not found."));
        }
        ensure_within(&self.base_path, &self.base_path.join(name))
    }
}
