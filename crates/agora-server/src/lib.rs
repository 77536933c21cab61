//! # agora-server
//!
//! HTTP API for Agora: accounts and profiles, the follow graph, posts with
//! per-IP view counting, ratings, comments and image uploads.
//!
//! The router is exposed through [`api::build_router`] so the binary and
//! the integration tests drive exactly the same service.

pub mod api;
pub mod auth;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod media_store;
pub mod rate_limit;

pub use api::{build_router, serve, AppState};
pub use config::ServerConfig;
pub use error::ApiError;
