//! # Nostr Account
//!
//! Accounts controlled by a Nostr secp256k1 key. A Schnorr signature over a
//! canonical authentication event proves control of the key; the account it
//! controls lives at an address derived from (owner, salt) and is created on
//! first use.
//!
//! ## Overview
//!
//! - **Verification**: BIP340-style Schnorr over secp256k1, strict or tolerant
//! - **Canonical event**: `[0,"<owner>",0,96024,[],"<operation digest>"]`
//! - **Derivation**: content-addressed 20-byte identifiers, predictable
//!   before creation
//! - **Registry**: idempotent create-or-get, in memory or SQLite
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nostr_account::{Gateway, GatewayConfig, AuthorizationRequest};
//!
//! async fn example(request: AuthorizationRequest) {
//!     let gateway = Gateway::open("accounts.db", GatewayConfig::default()).unwrap();
//!
//!     // Where the account lives, whether or not it exists yet
//!     let address = gateway.predict_address(&request.owner, &request.salt);
//!
//!     // Verify the signature, then resolve or create the account
//!     let account = gateway.authorize(&request).await.unwrap();
//!     assert_eq!(account.identifier, address);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `nostr_account::core` - Curve math, verification, event, derivation
//! - `nostr_account::registry` - Registry trait, memory and SQLite backends

pub mod error;
pub mod gateway;

// Re-export component crates
pub use nostr_account_core as core;
pub use nostr_account_registry as registry;

// Re-export main types for convenience
pub use error::{GatewayError, Result};
pub use gateway::{AuthorizedAccount, Gateway, GatewayConfig};

// Re-export commonly used types
pub use nostr_account_core::{
    canonical_event_bytes, derive_identifier, event_hash, verify, Address, AuthenticatedEvent,
    AuthorizationRequest, ImplementationDescriptor, LiftPolicy, OperationDigest, PublicKeyX, Salt,
    SchnorrVerifier, Sha256Hash, Signature, VerifyError,
};
pub use nostr_account_registry::{
    AccountRecord, AccountRegistry, BehaviorVersion, CreateResult, MemoryRegistry, SqliteRegistry,
};
