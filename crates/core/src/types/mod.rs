//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod price;
pub mod quantity;
pub mod status;
pub mod validation;

pub use address::{ShippingAddress, ShippingAddressInput};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use status::*;
pub use validation::{FieldError, ValidationErrors, require_text};
