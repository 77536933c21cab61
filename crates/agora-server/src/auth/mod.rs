//! Authentication: password hashing, signed tokens and the authenticated
//! requester extractor.

mod context;
pub mod password;
pub mod tokens;

pub use context::CurrentUser;
pub use password::{hash_password, verify_password};
pub use tokens::{Claims, TokenKind, TokenService};
