//! Registry trait: the abstract interface for account bookkeeping.
//!
//! Implementations include SQLite (persistent) and an in-memory concurrent
//! map. Both guarantee at most one creation per (owner, salt).

use std::fmt;

use async_trait::async_trait;
use nostr_account_core::{AccountDeriver, Address, ImplementationDescriptor, PublicKeyX, Salt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The behavior implementation an account currently delegates to.
///
/// Kept apart from the identity: upgrading it never changes the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BehaviorVersion(pub u32);

impl BehaviorVersion {
    /// The version a freshly created account starts with by default.
    pub const INITIAL: Self = Self(1);
}

impl Default for BehaviorVersion {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for BehaviorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A materialized account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub identifier: Address,
    pub owner: PublicKeyX,
    pub salt: Salt,
    /// When the account was created (Unix ms).
    pub created_at: i64,
}

/// Result of [`AccountRegistry::create_or_get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResult {
    /// This call created the account.
    Created(Address),
    /// The account already existed (idempotent, not an error).
    Existing(Address),
}

impl CreateResult {
    pub fn identifier(&self) -> Address {
        match self {
            CreateResult::Created(id) | CreateResult::Existing(id) => *id,
        }
    }

    /// True only for the single call that created the account.
    pub fn is_new(&self) -> bool {
        matches!(self, CreateResult::Created(_))
    }
}

/// Registry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Handle code every address is derived against.
    pub descriptor: ImplementationDescriptor,
    /// Behavior bound to newly created accounts.
    pub initial_behavior: BehaviorVersion,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            descriptor: ImplementationDescriptor::DEFAULT,
            initial_behavior: BehaviorVersion::INITIAL,
        }
    }
}

impl RegistryConfig {
    pub fn deriver(&self) -> AccountDeriver {
        AccountDeriver::new(self.descriptor)
    }
}

/// The AccountRegistry trait: async interface for account bookkeeping.
///
/// # Design Notes
///
/// - **Idempotent creation**: `create_or_get` returns `Created` exactly once
///   per (owner, salt), however many callers race; everyone else sees
///   `Existing` with the same identifier.
/// - **Prediction**: `get_address` never touches storage, and always equals
///   the identifier `create_or_get` returns later.
/// - **No partial records**: if materialization fails, nothing is recorded
///   and the error is `CreationFailed`.
/// - Records are never deleted or reassigned.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// The deriver addresses are computed with.
    fn deriver(&self) -> &AccountDeriver;

    /// The address the account for (owner, salt) has, or will have.
    ///
    /// Side-effect free; works whether or not the account exists.
    fn get_address(&self, owner: &PublicKeyX, salt: &Salt) -> Address {
        self.deriver().derive(owner, salt)
    }

    /// Return the existing account for (owner, salt), or create it.
    ///
    /// Rejects a zero owner with `InvalidOwner`.
    async fn create_or_get(&self, owner: &PublicKeyX, salt: &Salt) -> Result<CreateResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the record for (owner, salt), if created.
    async fn get_record(&self, owner: &PublicKeyX, salt: &Salt) -> Result<Option<AccountRecord>>;

    /// Get a record by its identifier.
    async fn get_by_identifier(&self, identifier: &Address) -> Result<Option<AccountRecord>>;

    /// All accounts of one owner, ordered by salt.
    async fn list_by_owner(&self, owner: &PublicKeyX) -> Result<Vec<AccountRecord>>;

    /// Number of created accounts.
    async fn count(&self) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Behavior
    // ─────────────────────────────────────────────────────────────────────────

    /// The behavior version bound to an account, if it exists.
    async fn behavior(&self, identifier: &Address) -> Result<Option<BehaviorVersion>>;

    /// Rebind an account to a newer behavior version.
    ///
    /// Fails with `NotFound` for unknown accounts and `StaleBehavior` unless
    /// `version` is strictly greater than the current one.
    async fn upgrade_behavior(&self, identifier: &Address, version: BehaviorVersion) -> Result<()>;
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
