//! Core types for Funda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod device;
pub mod email;
pub mod id;
pub mod price;

pub use device::DeviceType;
pub use email::{Email, EmailError, serialize_canonical};
pub use id::*;
pub use price::{CurrencyCode, Price};
