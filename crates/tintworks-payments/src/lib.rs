//! # Tintworks Payments
//!
//! The two consumed payment-processor interfaces:
//!
//! - [`client::PaymentClient`] creates hosted checkout sessions (the buyer
//!   is redirected to the processor's page; no card data touches this
//!   service).
//! - [`webhook`] verifies signed payment events and decodes them into a
//!   closed [`webhook::PaymentEvent`] enum — one variant per event kind we
//!   handle, plus an explicit catch-all, so unknown payloads cannot leak
//!   into downstream logic untyped.

pub mod client;
pub mod webhook;

pub use client::{CheckoutParams, CheckoutSession, PaymentClient};
pub use webhook::{CheckoutSessionCompleted, PaymentEvent, sign_payload, verify_event};
