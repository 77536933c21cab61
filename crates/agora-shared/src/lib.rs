//! # agora-shared
//!
//! Wire representations shared by the Agora store and server.
//!
//! Every request body has its own typed struct with field-level validation
//! rules (via `validator`), every response body has its own serializable
//! struct, and every failure is rendered through the single [`ErrorBody`]
//! envelope.

pub mod account;
pub mod constants;
pub mod engagement;
pub mod error;
pub mod page;
pub mod post;
pub mod profile;
pub mod types;
pub mod validation;

pub use error::{ErrorBody, ErrorCode, FieldErrors};
pub use page::{Page, PageQuery};
pub use types::{Gender, MessageResponse, PostOrdering, PostRef};
