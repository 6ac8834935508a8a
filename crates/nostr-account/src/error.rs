//! Error types for the gateway.

use nostr_account_core::VerifyError;
use nostr_account_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The signature or its inputs were rejected.
    #[error("verification error: {0}")]
    Verify(#[from] VerifyError),

    /// Registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The request could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] serde_json::Error),

    /// The gateway and its registry disagree on configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
