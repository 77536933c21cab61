//! # agora-store
//!
//! Relational storage for Agora, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model: users and profiles, the follow graph, posts with their view
//! records, ratings and comments.  Invariants that must hold under
//! concurrent writers (one view per post and IP, one rating per post and
//! user) are backed by unique indexes rather than read-then-write checks.

pub mod comments;
pub mod database;
pub mod follows;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod profiles;
pub mod ratings;
pub mod users;

mod error;
mod row;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
