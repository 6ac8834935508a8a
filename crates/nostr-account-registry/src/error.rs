//! Error types for the registry.

use nostr_account_core::Address;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No account with this identifier.
    #[error("account not found: {0}")]
    NotFound(Address),

    /// Behavior upgrades must be strictly increasing.
    #[error("behavior v{requested} does not supersede v{current} for {identifier}")]
    StaleBehavior {
        identifier: Address,
        current: u32,
        requested: u32,
    },

    /// The owner key is zero.
    #[error("owner key is zero")]
    InvalidOwner,

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The ledger host could not materialize the account. Nothing was recorded.
    #[error("creation of {identifier} failed: {reason}")]
    CreationFailed { identifier: Address, reason: String },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
