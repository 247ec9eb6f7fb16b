//! Storefront-only models.

pub mod session;

pub use session::{Cart, CartLine, keys as session_keys};
