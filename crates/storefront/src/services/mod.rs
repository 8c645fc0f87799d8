//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Admin login and bearer-token verification
//! - `token` - HS256 token signing
//! - `turnstile` - Cloudflare Turnstile human verification
//! - `orders` - Order pricing and intake
//! - `formspree` - Order relay to the shop inbox
//! - `recharge` - Lightning recharge quotes

pub mod auth;
pub mod formspree;
pub mod orders;
pub mod recharge;
pub mod token;
pub mod turnstile;

pub use auth::{AdminAuthService, AdminCredentials, AuthError};
pub use formspree::{FormspreeRelay, OrderRelay, RelayError};
pub use orders::{OrderError, OrderService};
pub use recharge::{RechargeError, RechargeQuote};
pub use token::{Claims, TokenError, TokenSigner};
pub use turnstile::{ChallengeError, ChallengeVerifier, TurnstileVerifier};

/// Short customer-facing reference: `prefix` plus the last six digits of a
/// millisecond timestamp.
#[must_use]
pub fn short_reference(prefix: &str, now_millis: i64) -> String {
    format!("{prefix}-{:06}", now_millis.rem_euclid(1_000_000))
}
