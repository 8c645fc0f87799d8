//! Formspree order relay.
//!
//! Orders are posted as a URL-encoded form; Formspree turns them into an
//! email to the shop and a reply-to for the customer.

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use crate::config::FormspreeConfig;
use crate::models::PricedOrder;

/// Errors relaying an order.
#[derive(Debug, Error)]
pub enum RelayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay answered with a non-success status.
    #[error("relay error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Order lines could not be serialized.
    #[error("order serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Hands a priced order to the shop.
#[async_trait]
pub trait OrderRelay: Send + Sync {
    /// Deliver `order`. No retries.
    async fn relay(&self, order: &PricedOrder) -> Result<(), RelayError>;
}

/// Form fields sent to the relay, in submission order.
///
/// # Errors
///
/// Returns `RelayError::Serialization` if the line items cannot be encoded.
pub fn form_fields(order: &PricedOrder) -> Result<Vec<(&'static str, String)>, RelayError> {
    Ok(vec![
        ("_replyto", order.email.as_str().to_string()),
        ("_subject", format!("Nuevo pedido {}", order.order_id)),
        ("name", order.name.clone()),
        ("phone", order.phone.clone()),
        ("email", order.email.as_str().to_string()),
        ("address", order.address.clone()),
        ("paymentMethod", order.payment_method.to_string()),
        ("total", format!("{} COP", order.total)),
        ("deliveryFee", format!("{} COP", order.delivery_fee)),
        ("items", serde_json::to_string(&order.lines)?),
        ("orderId", order.order_id.clone()),
    ])
}

/// Formspree HTTP client.
#[derive(Debug, Clone)]
pub struct FormspreeRelay {
    client: reqwest::Client,
    endpoint: String,
}

impl FormspreeRelay {
    /// Create a relay posting to the configured form endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &FormspreeConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl OrderRelay for FormspreeRelay {
    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    async fn relay(&self, order: &PricedOrder) -> Result<(), RelayError> {
        let fields = form_fields(order)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&fields)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RelayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("order relayed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use contraentrega_core::{DeliveryMethod, Email, PaymentMethod, Price, ProductId};

    use super::*;
    use crate::models::OrderLine;

    fn order() -> PricedOrder {
        PricedOrder {
            order_id: "ORD-123456".to_string(),
            name: "Ana".to_string(),
            phone: "3001234567".to_string(),
            email: Email::parse("ana@example.co").unwrap(),
            address: "Calle 5 # 10-20".to_string(),
            delivery: DeliveryMethod::Delivery,
            payment_method: PaymentMethod::Cop,
            lines: vec![OrderLine {
                product_id: ProductId::normalize("cafe").unwrap(),
                name: "Café".to_string(),
                quantity: 2,
                unit_price: Price::new(15_000).unwrap(),
                subtotal: Price::new(30_000).unwrap(),
            }],
            delivery_fee: Price::new(5_000).unwrap(),
            total: Price::new(35_000).unwrap(),
        }
    }

    #[test]
    fn test_form_fields() {
        let fields = form_fields(&order()).unwrap();
        let get = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("_replyto"), "ana@example.co");
        assert_eq!(get("_subject"), "Nuevo pedido ORD-123456");
        assert_eq!(get("paymentMethod"), "COP");
        assert_eq!(get("total"), "$35.000 COP");
        assert_eq!(get("deliveryFee"), "$5.000 COP");
        assert_eq!(get("orderId"), "ORD-123456");

        let items: serde_json::Value = serde_json::from_str(get("items")).unwrap();
        assert_eq!(items[0]["nombre"], "Café");
        assert_eq!(items[0]["subtotal"], 30_000);
    }

    #[test]
    fn test_form_field_order() {
        let names: Vec<_> = form_fields(&order())
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(names.first(), Some(&"_replyto"));
        assert_eq!(names.last(), Some(&"orderId"));
        assert_eq!(names.len(), 11);
    }
}
