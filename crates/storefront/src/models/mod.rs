//! Domain models for storefront.
//!
//! These types represent validated domain objects separate from database row
//! types (see [`crate::db`]).

pub mod catalog;
pub mod order;

pub use catalog::{Category, Product};
pub use order::{Order, OrderItem};
