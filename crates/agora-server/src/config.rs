//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use agora_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_UPLOAD_SIZE};

/// Signing secret used when `JWT_SECRET` is unset. Development only.
pub const DEV_JWT_SECRET: &str = "agora-dev-secret-change-me";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./agora.db`
    pub database_path: PathBuf,

    /// Filesystem path where uploaded images are stored.
    /// Env: `MEDIA_ROOT`
    /// Default: `./media`
    pub media_root: PathBuf,

    /// URL prefix under which stored media is served.
    /// Env: `MEDIA_URL`
    /// Default: `/media`
    pub media_url: String,

    /// Maximum upload size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,

    /// HMAC secret for signing access, refresh and reset tokens.
    /// Env: `JWT_SECRET`
    pub jwt_secret: String,

    /// Env: `ACCESS_TOKEN_TTL_SECS` (default 3600)
    pub access_token_ttl_secs: i64,

    /// Env: `REFRESH_TOKEN_TTL_SECS` (default 86400)
    pub refresh_token_ttl_secs: i64,

    /// Env: `PASSWORD_RESET_TTL_SECS` (default 3600)
    pub password_reset_ttl_secs: i64,

    /// Env: `PAGE_SIZE`
    pub page_size: u32,

    /// Env: `MAX_PAGE_SIZE`
    pub max_page_size: u32,

    /// Sustained requests per second per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    pub rate_limit_per_sec: f64,

    /// Burst capacity per client IP.
    /// Env: `RATE_LIMIT_BURST`
    pub rate_limit_burst: f64,

    /// When true, only the comment's author (or a superuser) may edit or
    /// delete it. Off by default: any authenticated user may.
    /// Env: `ENFORCE_COMMENT_OWNERSHIP` (true/false)
    pub enforce_comment_ownership: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./agora.db"),
            media_root: PathBuf::from("./media"),
            media_url: "/media".to_string(),
            max_upload_size: MAX_UPLOAD_SIZE,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl_secs: 60 * 60,
            refresh_token_ttl_secs: 24 * 60 * 60,
            password_reset_ttl_secs: 60 * 60,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            enforce_comment_ownership: false,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("media_root", &self.media_root)
            .field("media_url", &self.media_url)
            .field("max_upload_size", &self.max_upload_size)
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("password_reset_ttl_secs", &self.password_reset_ttl_secs)
            .field("page_size", &self.page_size)
            .field("max_page_size", &self.max_page_size)
            .field("rate_limit_per_sec", &self.rate_limit_per_sec)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("enforce_comment_ownership", &self.enforce_comment_ownership)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        parse_into(&lookup, "HTTP_ADDR", &mut config.http_addr);

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("MEDIA_ROOT") {
            config.media_root = PathBuf::from(path);
        }
        if let Some(url) = lookup("MEDIA_URL") {
            let url = url.trim_end_matches('/');
            if url.starts_with('/') && url.len() > 1 {
                config.media_url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid MEDIA_URL, using default");
            }
        }
        parse_into(&lookup, "MAX_UPLOAD_SIZE", &mut config.max_upload_size);

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set, using development secret"),
        }

        parse_into(&lookup, "ACCESS_TOKEN_TTL_SECS", &mut config.access_token_ttl_secs);
        parse_into(&lookup, "REFRESH_TOKEN_TTL_SECS", &mut config.refresh_token_ttl_secs);
        parse_into(&lookup, "PASSWORD_RESET_TTL_SECS", &mut config.password_reset_ttl_secs);
        parse_into(&lookup, "PAGE_SIZE", &mut config.page_size);
        parse_into(&lookup, "MAX_PAGE_SIZE", &mut config.max_page_size);
        parse_into(&lookup, "RATE_LIMIT_PER_SEC", &mut config.rate_limit_per_sec);
        parse_into(&lookup, "RATE_LIMIT_BURST", &mut config.rate_limit_burst);

        if let Some(val) = lookup("ENFORCE_COMMENT_OWNERSHIP") {
            config.enforce_comment_ownership = val == "true" || val == "1";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_into<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, field: &mut T) {
    if let Some(raw) = lookup(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => *field = value,
            Err(_) => tracing::warn!(var = name, value = %raw, "Invalid value, using default"),
        }
    }
}
