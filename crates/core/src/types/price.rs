//! Prices in minor currency units.
//!
//! The shop sells in Colombian pesos, which have no fractional unit in
//! practice, so a price is a plain non-negative integer amount.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::product::ProductError;

/// A non-negative price in COP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero pesos.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in pesos.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NegativePrice` for amounts below zero.
    pub const fn new(amount: i64) -> Result<Self, ProductError> {
        if amount < 0 {
            return Err(ProductError::NegativePrice(amount));
        }
        Ok(Self(amount))
    }

    /// The amount in pesos.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Price of `quantity` units, saturating on overflow.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Sum of two prices, saturating on overflow.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Format for display with Colombian thousands grouping (e.g. `$15.000`).
    #[must_use]
    pub fn display(&self) -> String {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        format!("${grouped}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl TryFrom<i64> for Price {
    type Error = ProductError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = i64::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}
