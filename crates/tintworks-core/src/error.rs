//! Workspace-wide error type.
//!
//! One variant per failure domain. Every variant carries a message string;
//! upstream causes are flattened into the message at the call site. All
//! request-level failures are terminal — nothing here is retried.

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, TintworksError>;

#[derive(Error, Debug)]
pub enum TintworksError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// No verified caller identity. Maps to HTTP 401.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// A required request field is missing or malformed. Maps to HTTP 400.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The payment processor rejected or failed a call.
    #[error("Payment provider error: {0}")]
    Payment(String),

    /// An incoming webhook failed signature verification. Maps to HTTP 400
    /// with no state change.
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Order store error: {0}")]
    Store(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
