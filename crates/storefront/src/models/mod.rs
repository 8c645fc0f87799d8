//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from wire and
//! row types.

pub mod order;

pub use order::{OrderConfirmation, OrderLine, OrderRequest, PICKUP_ADDRESS, PricedOrder};
