/// API prefix for every versioned route.
pub const API_PREFIX: &str = "/api/v1";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for a client-requested `page_size`
pub const MAX_PAGE_SIZE: u32 = 100;

/// Ratings are whole stars in this inclusive range
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Maximum number of tags attached to a single post
pub const MAX_TAGS_PER_POST: usize = 10;

/// Maximum upload size for media in bytes (5 MiB)
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Header consulted first when resolving the client address
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Address recorded when neither the forwarded header nor the peer is known
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// Confirmation messages returned by mutating endpoints
pub const MSG_POST_CREATED: &str = "Post has been created!";
pub const MSG_POST_NOT_FOUND: &str = "That Post does not exist in our catalog";
pub const MSG_RATING_ADDED: &str = "Rating has been added";
pub const MSG_ZERO_RATING: &str = "You can't give a zero rating";
pub const MSG_COMMENT_DELETED: &str = "Comment deleted successfully";
pub const MSG_NO_ACTIVE_ACCOUNT: &str = "No active account found with the given credentials";
pub const MSG_PASSWORD_RESET_SENT: &str =
    "If an account exists for that email, a password reset link has been sent";
pub const MSG_PASSWORD_RESET_DONE: &str = "Password has been reset";
