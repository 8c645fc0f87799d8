//! Core types for the Contraentrega catalog and orders.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;

pub use email::{Email, EmailError};
pub use id::{PRODUCT_ID_SIGIL, ProductId};
pub use order::{DELIVERY_FEE, DeliveryMethod, PaymentMethod};
pub use price::Price;
pub use product::{Product, ProductError};
