//! Emporium Core - Shared domain types.
//!
//! This crate provides the value types used across all Emporium components:
//! - `api` - JSON REST backend (catalog, cart, checkout, orders, users)
//! - `cli` - Command-line tools for migrations, seeding, and user management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Every constructor that can fail returns a typed error, so
//! a value of one of these types is always valid once it exists.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, quantities, emails, statuses, and
//!   shipping addresses, plus the field-level validation error list

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
