//! # agora-server
//!
//! Binary entry point: loads configuration, opens the database and media
//! store, then serves the HTTP API until Ctrl+C.

use std::time::Duration;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use agora_server::media_store::MediaStore;
use agora_server::rate_limit::RateLimiter;
use agora_server::{serve, AppState, ServerConfig};
use agora_store::Database;

const PURGE_EVERY: Duration = Duration::from_secs(5 * 60);
const CLIENT_IDLE: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // Logging (RUST_LOG overrides the default filter)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug,agora_store=debug")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "agora-server starting");

    // -----------------------------------------------------------------------
    // Configuration and storage
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "configuration loaded");

    let db = Database::open_at(&config.database_path)?;
    let media = MediaStore::new(
        config.media_root.clone(),
        config.media_url.clone(),
        config.max_upload_size,
    )
    .await?;
    info!(
        database = %config.database_path.display(),
        media = %config.media_root.display(),
        "storage ready"
    );

    let http_addr = config.http_addr;
    let state = AppState::new(db, media, config);

    // -----------------------------------------------------------------------
    // Housekeeping
    // -----------------------------------------------------------------------
    tokio::spawn(forget_idle_clients(state.rate_limiter.clone()));

    // -----------------------------------------------------------------------
    // Serve until the listener fails or Ctrl+C
    // -----------------------------------------------------------------------
    tokio::select! {
        result = serve(state, http_addr) => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down");
        }
    }

    Ok(())
}

async fn forget_idle_clients(limiter: RateLimiter) {
    let mut ticker = tokio::time::interval(PURGE_EVERY);
    loop {
        ticker.tick().await;
        let purged = limiter.purge_stale(CLIENT_IDLE).await;
        if purged > 0 {
            debug!(purged, "forgot idle rate-limit clients");
        }
    }
}
