//! Funda Core - Shared types library.
//!
//! This crate provides common types used across all Funda components:
//! - `store` - Store backends, generic repository and schema bootstrapper
//! - `admin` - Internal administration screens
//! - `storefront` - Public-facing marketing homepage
//! - `cli` - Command-line tools for table setup and seeding
//!
//! # Architecture
//!
//! The core crate contains only types, static descriptors and pure functions -
//! no I/O, no database access, no HTTP clients. This keeps it lightweight and
//! allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails and devices
//! - [`schema`] - Static table descriptors and the [`Entity`] trait
//! - [`models`] - Stored records and insert drafts for each table
//! - [`stats`] - Client-side aggregation over fetched rows
//! - [`shell`] - Page chrome contract shared by admin and storefront
//! - [`seed`] - Dummy rows for the "insert dummy data" actions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod schema;
pub mod seed;
pub mod shell;
pub mod stats;
pub mod types;

pub use models::*;
pub use schema::{
    Column, ColumnDefault, ColumnType, Draft, Entity, EntityKind, Index, SortDirection, SortField,
    TableSchema, UnknownEntity, ValidationError,
};
pub use seed::Seeded;
pub use shell::{CartCount, Layout, Shell};
pub use stats::{InventoryStats, MailStats, Tally, TrackingStats, UserStats};
pub use types::*;
