//! Contraentrega CO storefront library.
//!
//! Cash-on-delivery storefront with a read-through catalog cache and a
//! bearer-token inventory admin. Exposed as a library so the binary, the
//! CLI and the integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::{RateLimiting, app};
pub use state::{AppState, Backends};
