//! PBEshop Core - Shared domain types.
//!
//! This crate provides the types shared by every PBEshop component:
//! - `storefront` - Catalog, cart and checkout web application
//! - `cli` - Migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The cart ledger lives here so it can be reused as a plain
//! in-memory ledger outside of any web session.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and slugs
//! - [`cart`] - The product-id keyed line-item ledger behind the shopping cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartLedger, LedgerError, LineItem};
pub use types::*;
