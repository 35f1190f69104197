//! Domain models for the shop API.
//!
//! These are the validated shapes that cross the store boundary and are
//! serialized to clients. Request bodies with optional fields live next to
//! the model they produce.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartError, CartItem};
pub use order::{CheckoutError, CheckoutLine, Order, OrderDraft, OrderItem};
pub use product::{NewProduct, Product, ProductInput};
pub use user::{NewUser, User};
