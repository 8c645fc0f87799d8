//! Contraentrega Core - Shared domain types.
//!
//! Types used by every Contraentrega CO component:
//! - `storefront` - Public storefront, catalog API and inventory admin
//! - `cli` - Migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. Database encoding for the key types is available
//! behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Product keys, prices, products, emails and order enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
