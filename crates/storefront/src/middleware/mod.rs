//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and sniffing protection)
//! 5. CSP nonce (per-request nonce for inline scripts)
//! 6. Rate limiting (governor, login and order routes only)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAdmin, bearer_token};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{ClientIp, client_ip, login_rate_limiter, order_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
