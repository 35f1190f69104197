//! Emporium API library.
//!
//! JSON REST backend for a small shop: catalog, per-user carts, checkout and
//! order history behind bearer-token auth. The binary in `main.rs` wires this
//! library to a real listener; tests drive [`routes::build_router`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
