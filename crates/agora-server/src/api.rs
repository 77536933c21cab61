use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use agora_shared::constants::API_PREFIX;
use agora_store::Database;

use crate::auth::TokenService;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::handlers::{accounts, comments, media, posts, profiles, ratings};
use crate::media_store::MediaStore;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

/// Body limit for JSON requests; uploads get `max_upload_size` plus slack
/// for multipart framing.
const JSON_BODY_LIMIT: usize = 1024 * 1024;
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub tokens: Arc<TokenService>,
    pub media: Arc<MediaStore>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, media: MediaStore, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            tokens: Arc::new(TokenService::from_config(&config)),
            media: Arc::new(media),
            rate_limiter: RateLimiter::from_config(&config),
            config: Arc::new(config),
        }
    }

    /// Lock the database. The guard must not be held across an await.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("database mutex poisoned"))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let upload_limit = state.config.max_upload_size + MULTIPART_OVERHEAD;

    let p = |path: &str| format!("{API_PREFIX}{path}");

    let uploads = Router::new()
        .route(&p("/media/"), post(media::upload))
        .layer(DefaultBodyLimit::max(upload_limit));

    let api = Router::new()
        // accounts
        .route(&p("/account/register/"), post(accounts::register))
        .route(&p("/account/token/"), post(accounts::obtain_token))
        .route(&p("/account/token/refresh/"), post(accounts::refresh_token))
        .route(&p("/account/me/"), get(accounts::me))
        .route(&p("/account/password-reset/"), post(accounts::request_password_reset))
        .route(
            &p("/account/password-reset/confirm/"),
            post(accounts::confirm_password_reset),
        )
        // profiles
        .route(&p("/profiles/"), get(profiles::list))
        .route(&p("/profiles/me/"), get(profiles::me))
        .route(
            &p("/profiles/{username}/"),
            get(profiles::detail).patch(profiles::update),
        )
        .route(&p("/profiles/{username}/follow/"), post(profiles::follow_profile))
        .route(&p("/profiles/{username}/unfollow/"), post(profiles::unfollow_profile))
        .route(&p("/profiles/{username}/following/"), get(profiles::following))
        .route(&p("/profiles/{username}/followers/"), get(profiles::followers))
        // posts
        .route(&p("/posts/"), get(posts::list).post(posts::create))
        .route(
            &p("/posts/{id}/"),
            get(posts::retrieve)
                .put(posts::update)
                .patch(posts::update)
                .delete(posts::delete),
        )
        .route(&p("/posts/{id}/ratings/"), post(ratings::create))
        .route(
            &p("/posts/{id}/comments/"),
            get(comments::list).post(comments::create),
        )
        .route(
            &p("/comments/{id}/"),
            put(comments::update)
                .patch(comments::update)
                .delete(comments::delete),
        )
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));

    let media_route = format!("{}/{{name}}", state.config.media_url);

    Router::new()
        .route("/health", get(health_check))
        .route(&media_route, get(media::serve))
        .merge(api)
        .merge(uploads)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
