//! # Nostr Account Registry
//!
//! Bookkeeping for Nostr-keyed accounts: which (owner, salt) pairs have been
//! materialized, under which identifier, bound to which behavior version.
//!
//! ## Key Types
//!
//! - [`AccountRegistry`] - The async trait for all registry operations
//! - [`MemoryRegistry`] - Concurrent in-memory registry
//! - [`SqliteRegistry`] - SQLite-based persistent registry
//! - [`CreateResult`] - Outcome of `create_or_get`
//! - [`Materializer`] - Ledger host hook run once per created account
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nostr_account_core::{PublicKeyX, Salt};
//! use nostr_account_registry::{AccountRegistry, SqliteRegistry};
//!
//! async fn example() {
//!     let registry = SqliteRegistry::open("accounts.db").unwrap();
//!     let owner = PublicKeyX::from_bytes([0x42; 32]);
//!
//!     let predicted = registry.get_address(&owner, &Salt::from_u64(0));
//!     let result = registry.create_or_get(&owner, &Salt::from_u64(0)).await.unwrap();
//!     assert_eq!(result.identifier(), predicted);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent creation**: a second `create_or_get` returns `Existing`
//! - **Prediction**: `get_address` equals the identifier assigned later
//! - **Stable identity**: behavior upgrades never change the identifier

pub mod error;
mod locks;
pub mod materializer;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{RegistryError, Result};
pub use materializer::{MaterializeError, Materializer, NoopMaterializer};
pub use memory::MemoryRegistry;
pub use sqlite::SqliteRegistry;
pub use traits::{AccountRecord, AccountRegistry, BehaviorVersion, CreateResult, RegistryConfig};
