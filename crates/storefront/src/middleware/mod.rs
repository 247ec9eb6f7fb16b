//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory)
//! 5. Visit tracking (one `users_tracking` row per session)
//! 6. Security headers (CSP, frame and referrer policy)

pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod tracking;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
pub use tracking::visit_tracking_middleware;
