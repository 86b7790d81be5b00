//! App.net OAuth authentication
//!
//! Handles:
//! - App.net OAuth flow
//! - Signed session cookies
//! - Authentication guards

mod middleware;
mod oauth;
pub mod session;

pub use middleware::{CurrentUser, current_session, require_session};
pub use oauth::auth_router;
pub use session::{Session, SessionCodec};

/// Login route; also the OAuth2 callback
pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
