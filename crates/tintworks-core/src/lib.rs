//! # Tintworks Core
//!
//! Shared foundation for the Tintworks storefront backend: the TOML
//! configuration system, the workspace-wide error type, and the domain
//! records (service catalog entries, order records) that the store, mail,
//! and gateway crates exchange.

pub mod config;
pub mod error;
pub mod types;

pub use config::TintworksConfig;
pub use error::{Result, TintworksError};
