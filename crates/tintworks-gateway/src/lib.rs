//! # Tintworks Gateway
//!
//! The HTTP surface of the storefront: service catalog, checkout-session
//! creation, payment and signup webhooks, order lookup for the success
//! page, and the FAQ chat endpoints.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
