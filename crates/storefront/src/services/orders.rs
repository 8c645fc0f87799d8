//! Order intake.
//!
//! Validates the storefront order form, prices every line against the
//! catalog and relays the result to the shop.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use contraentrega_core::{DeliveryMethod, Email, EmailError, Price, ProductId};

use super::formspree::{OrderRelay, RelayError};
use super::short_reference;
use crate::catalog::{CatalogError, CatalogService};
use crate::models::{OrderLine, OrderRequest, PICKUP_ADDRESS, PricedOrder};

/// Errors placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A required text field is blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The customer email is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No line has a positive quantity.
    #[error("order has no items")]
    EmptyOrder,

    /// Home delivery requested without an address.
    #[error("an address is required for home delivery")]
    MissingAddress,

    /// A line references a product the catalog does not have.
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// A line asks for more units than are in stock.
    #[error("insufficient stock for {id}: requested {requested}, available {available}")]
    InsufficientStock {
        id: String,
        requested: u32,
        available: u32,
    },

    /// No relay is configured.
    #[error("order relay is not configured")]
    RelayNotConfigured,

    /// The relay rejected or failed to receive the order.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(CatalogError),
}

/// Prices and relays storefront orders.
#[derive(Clone)]
pub struct OrderService {
    catalog: CatalogService,
    relay: Option<Arc<dyn OrderRelay>>,
}

impl OrderService {
    /// Create an order service. Without a relay, orders are priced but
    /// rejected at submission.
    #[must_use]
    pub fn new(catalog: CatalogService, relay: Option<Arc<dyn OrderRelay>>) -> Self {
        Self { catalog, relay }
    }

    /// Validate and price `request` without relaying it.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` for invalid fields, unknown products, lines
    /// above stock, or catalog failures.
    pub async fn price(
        &self,
        request: OrderRequest,
        now_millis: i64,
    ) -> Result<PricedOrder, OrderError> {
        let name = required(&request.name, "name")?;
        let phone = required(&request.phone, "phone")?;
        let email = Email::parse(&request.email)?;

        let address = match request.delivery {
            DeliveryMethod::Delivery => request
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .ok_or(OrderError::MissingAddress)?
                .to_string(),
            DeliveryMethod::Pickup => PICKUP_ADDRESS.to_string(),
        };

        let mut lines = Vec::new();
        for (id, quantity) in merge_items(&request.items)? {
            let product = match self.catalog.get(id.as_str()).await {
                Ok(item) => item.product,
                Err(CatalogError::NotFound(_)) => {
                    return Err(OrderError::UnknownProduct(id.into_inner()));
                }
                Err(e) => return Err(OrderError::Catalog(e)),
            };

            if quantity > product.stock {
                return Err(OrderError::InsufficientStock {
                    id: product.id.to_string(),
                    requested: quantity,
                    available: product.stock,
                });
            }

            lines.push(OrderLine {
                subtotal: product.price.times(quantity),
                product_id: product.id,
                name: product.name,
                quantity,
                unit_price: product.price,
            });
        }

        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let delivery_fee = request.delivery.fee();
        let total = lines
            .iter()
            .fold(Price::ZERO, |acc, line| acc.plus(line.subtotal))
            .plus(delivery_fee);

        Ok(PricedOrder {
            order_id: short_reference("ORD", now_millis),
            name,
            phone,
            email,
            address,
            delivery: request.delivery,
            payment_method: request.payment_method,
            lines,
            delivery_fee,
            total,
        })
    }

    /// Price `request` and hand it to the relay.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::RelayNotConfigured` without a relay,
    /// `OrderError::Relay` if delivery fails, and any pricing error.
    #[instrument(skip(self, request))]
    pub async fn place(
        &self,
        request: OrderRequest,
        now_millis: i64,
    ) -> Result<PricedOrder, OrderError> {
        let relay = self.relay.as_ref().ok_or(OrderError::RelayNotConfigured)?;
        let order = self.price(request, now_millis).await?;

        relay.relay(&order).await?;

        tracing::info!(
            order_id = %order.order_id,
            total = order.total.amount(),
            lines = order.lines.len(),
            "order placed"
        );
        Ok(order)
    }
}

/// Positive quantities keyed by canonical id, so `pan` and `@pan` count
/// against the same stock.
fn merge_items(items: &BTreeMap<String, u32>) -> Result<BTreeMap<ProductId, u32>, OrderError> {
    let mut merged = BTreeMap::new();
    for (fragment, &quantity) in items.iter().filter(|(_, q)| **q > 0) {
        let id = ProductId::normalize(fragment)
            .map_err(|_| OrderError::UnknownProduct(fragment.clone()))?;
        let total: &mut u32 = merged.entry(id).or_default();
        *total = total.saturating_add(quantity);
    }
    Ok(merged)
}

fn required(value: &str, field: &'static str) -> Result<String, OrderError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OrderError::MissingField(field));
    }
    Ok(value.to_string())
}
