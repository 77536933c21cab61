//! Per-client throttling for every route.
//!
//! Each client address owns a bucket holding up to `burst` request
//! allowances, refilled at `per_sec`. The socket peer identifies the client;
//! `X-Forwarded-For` is only consulted when no peer was recorded. Clients
//! whose address cannot be resolved share no bucket and are let through.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::client_ip::resolve_throttle_ip;
use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct Allowance {
    remaining: f64,
    touched: Instant,
}

impl Allowance {
    fn full(burst: f64, now: Instant) -> Self {
        Self {
            remaining: burst,
            touched: now,
        }
    }

    fn take(&mut self, now: Instant, per_sec: f64, burst: f64) -> bool {
        let idle = now.saturating_duration_since(self.touched).as_secs_f64();
        self.touched = now;
        self.remaining = (self.remaining + idle * per_sec).min(burst);
        if self.remaining < 1.0 {
            return false;
        }
        self.remaining -= 1.0;
        true
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    clients: Arc<Mutex<HashMap<IpAddr, Allowance>>>,
    per_sec: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(per_sec: f64, burst: f64) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            per_sec,
            burst,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.rate_limit_per_sec, config.rate_limit_burst)
    }

    /// Spend one allowance for `ip`.
    pub async fn admit(&self, ip: IpAddr) -> Result<(), ApiError> {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let allowance = clients
            .entry(ip)
            .or_insert_with(|| Allowance::full(self.burst, now));
        if allowance.take(now, self.per_sec, self.burst) {
            Ok(())
        } else {
            Err(ApiError::Throttled)
        }
    }

    /// Forget clients not seen for `idle`.
    pub async fn purge_stale(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, allowance| now.saturating_duration_since(allowance.touched) < idle);
        before - clients.len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(ip) = resolve_throttle_ip(req.headers(), req.extensions()) {
        if let Err(e) = limiter.admit(ip).await {
            warn!(ip = %ip, path = %req.uri().path(), "client throttled");
            return e.into_response();
        }
    }
    next.run(req).await
}
