//! Order enums shared by the storefront form and the order relay.

use serde::{Deserialize, Serialize};

use super::price::Price;

/// Flat fee charged for home delivery, in COP.
pub const DELIVERY_FEE: Price = match Price::new(5000) {
    Ok(price) => price,
    Err(_) => Price::ZERO,
};

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Courier to the customer's address.
    #[default]
    Delivery,
    /// Customer collects at the pickup point.
    Pickup,
}

impl DeliveryMethod {
    /// Fee added to the order total.
    #[must_use]
    pub const fn fee(self) -> Price {
        match self {
            Self::Delivery => DELIVERY_FEE,
            Self::Pickup => Price::ZERO,
        }
    }
}

/// How the customer pays on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Cash or bank transfer in Colombian pesos.
    #[default]
    #[serde(rename = "COP")]
    Cop,
    /// Bitcoin over the Lightning network.
    Lightning,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cop => write!(f, "COP"),
            Self::Lightning => write!(f, "Lightning"),
        }
    }
}
