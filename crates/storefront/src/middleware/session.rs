//! Session middleware configuration.
//!
//! Sessions hold only the tracking id and the cart, so they live in process
//! memory and are lost on restart.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "funda_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer. Cookies are `Secure` when `secure` is set.
#[must_use]
pub fn create_session_layer(secure: bool) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
