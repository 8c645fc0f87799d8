//! Catalog product.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;

/// Errors raised while building or validating catalog data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductError {
    /// The product key is empty once the sigil is stripped.
    #[error("product id cannot be empty")]
    EmptyId,

    /// The display name is empty.
    #[error("product name cannot be empty")]
    EmptyName,

    /// The image path is empty.
    #[error("product image cannot be empty")]
    EmptyImage,

    /// The price is below zero.
    #[error("price cannot be negative (got {0})")]
    NegativePrice(i64),
}

/// A product as held by the durable store.
///
/// `image` is a path relative to the configured image base URL; the absolute
/// URL is derived when the product is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub stock: u32,
    pub image: String,
}

impl Product {
    /// Check the fields that the type system does not already enforce.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::EmptyName` or `ProductError::EmptyImage`.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.image.trim().is_empty() {
            return Err(ProductError::EmptyImage);
        }
        Ok(())
    }

    /// Whether at least one unit can be ordered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}
