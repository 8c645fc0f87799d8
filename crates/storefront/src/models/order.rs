//! Order domain types.
//!
//! An [`OrderRequest`] is what the storefront form posts; a [`PricedOrder`]
//! is the same order after every line has been priced against the catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use contraentrega_core::{DeliveryMethod, Email, PaymentMethod, Price, ProductId};

/// Address recorded for orders collected at the pickup point.
pub const PICKUP_ADDRESS: &str = "Recoger en punto";

/// Order as submitted by the storefront.
///
/// Client-side totals are ignored; lines are priced from the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub delivery: DeliveryMethod,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Product id fragment to quantity.
    pub items: BTreeMap<String, u32>,
}

/// One priced line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    #[serde(skip)]
    pub product_id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio")]
    pub unit_price: Price,
    pub subtotal: Price,
}

/// A validated order with server-side pricing.
#[derive(Debug, Clone)]
pub struct PricedOrder {
    /// Reference shown to the customer (`ORD-123456`).
    pub order_id: String,
    pub name: String,
    pub phone: String,
    pub email: Email,
    /// Delivery address, or [`PICKUP_ADDRESS`].
    pub address: String,
    pub delivery: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub lines: Vec<OrderLine>,
    pub delivery_fee: Price,
    /// Sum of line subtotals plus the delivery fee.
    pub total: Price,
}

/// Response body for an accepted order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub success: bool,
    pub order_id: String,
    pub total: Price,
    pub delivery_fee: Price,
    pub payment_method: PaymentMethod,
}

impl From<&PricedOrder> for OrderConfirmation {
    fn from(order: &PricedOrder) -> Self {
        Self {
            success: true,
            order_id: order.order_id.clone(),
            total: order.total,
            delivery_fee: order.delivery_fee,
            payment_method: order.payment_method,
        }
    }
}
