//! Error types for domain reconciliation
//!
//! Every failure is raised to the caller. Nothing in this crate retries,
//! suppresses, or rolls back a partially applied reconcile pass.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the domain reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Registration requested but the registrar reports the name unavailable
    #[error("Domain {0} is not available")]
    NotAvailable(String),

    /// Transfer requested but the registrar rejects it
    #[error("Domain {0} is not transferable")]
    NotTransferable(String),

    /// Update requested for a domain the registrar has no record of
    #[error("Domain {0} does not exist")]
    NotFound(String),

    /// Any failure of an underlying registrar call
    #[error("Registrar gateway error ({gateway}): {message}")]
    Gateway {
        /// Gateway name
        gateway: String,
        /// Error message
        message: String,
    },

    /// The registrar gateway could not be constructed
    #[error("Fatal: {0}")]
    Fatal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed lifecycle event or desired state
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors while reading events
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a "not available" error
    pub fn not_available(domain: impl Into<String>) -> Self {
        Self::NotAvailable(domain.into())
    }

    /// Create a "not transferable" error
    pub fn not_transferable(domain: impl Into<String>) -> Self {
        Self::NotTransferable(domain.into())
    }

    /// Create a "not found" error
    pub fn not_found(domain: impl Into<String>) -> Self {
        Self::NotFound(domain.into())
    }

    /// Create a gateway error
    pub fn gateway(gateway: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway {
            gateway: gateway.into(),
            message: message.into(),
        }
    }

    /// Create a fatal construction error
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error came from the registrar itself
    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }
}
