//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Session-backed cart over the core ledger
//! - `checkout` - Order form validation and cart-to-order conversion

pub mod cart;
pub mod checkout;

pub use cart::{Cart, CartError, CartItem, CartItems, Catalog, SessionStore, SessionStoreError};
pub use checkout::{
    CheckoutError, FormErrors, NewOrder, NewOrderItem, OrderForm, OrderStore, place_order,
};
