//! In-memory implementation of the AccountRegistry trait.
//!
//! Same semantics as SQLite but nothing persists. Accounts live in a sharded
//! concurrent map; creation is serialized per key by an async lock, so a slow
//! materializer only holds up callers of its own key.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

use nostr_account_core::{AccountDeriver, Address, PublicKeyX, Salt};

use crate::error::{RegistryError, Result};
use crate::locks::KeyLocks;
use crate::materializer::{materialize_blocking, Materializer, NoopMaterializer};
use crate::traits::{
    now_millis, AccountRecord, AccountRegistry, BehaviorVersion, CreateResult, RegistryConfig,
};

/// In-memory registry.
///
/// All data is lost when the registry is dropped.
pub struct MemoryRegistry {
    config: RegistryConfig,
    deriver: AccountDeriver,

    /// Records keyed by (owner, salt).
    accounts: DashMap<(PublicKeyX, Salt), AccountRecord>,

    /// Identifier index: identifier -> (owner, salt).
    by_identifier: DashMap<Address, (PublicKeyX, Salt)>,

    /// Current behavior per account.
    behaviors: DashMap<Address, BehaviorVersion>,

    /// Keys with a creation in flight.
    creating: KeyLocks<(PublicKeyX, Salt)>,

    materializer: Arc<dyn Materializer>,
}

impl MemoryRegistry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            deriver: config.deriver(),
            config,
            accounts: DashMap::new(),
            by_identifier: DashMap::new(),
            behaviors: DashMap::new(),
            creating: KeyLocks::new(),
            materializer: Arc::new(NoopMaterializer),
        }
    }

    /// Replace the materializer invoked on creation.
    pub fn with_materializer(mut self, materializer: Arc<dyn Materializer>) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRegistry for MemoryRegistry {
    fn deriver(&self) -> &AccountDeriver {
        &self.deriver
    }

    async fn create_or_get(&self, owner: &PublicKeyX, salt: &Salt) -> Result<CreateResult> {
        if owner.is_zero() {
            return Err(RegistryError::InvalidOwner);
        }

        let key = (*owner, *salt);
        if let Some(existing) = self.accounts.get(&key) {
            debug!(identifier = %existing.identifier, "account already exists");
            return Ok(CreateResult::Existing(existing.identifier));
        }

        // Creators of this key queue here; no map guard is held while they wait.
        let _guard = self.creating.lock(&key).await;
        if let Some(existing) = self.accounts.get(&key) {
            debug!(identifier = %existing.identifier, "account already exists");
            return Ok(CreateResult::Existing(existing.identifier));
        }

        let identifier = self.deriver.derive(owner, salt);
        let record = AccountRecord {
            identifier,
            owner: *owner,
            salt: *salt,
            created_at: now_millis(),
        };

        materialize_blocking(&self.materializer, &record).await?;

        // Record first: an indexed identifier always resolves.
        self.accounts.insert(key, record);
        self.by_identifier.insert(identifier, key);
        self.behaviors
            .insert(identifier, self.config.initial_behavior);

        info!(identifier = %identifier, owner = %owner, "account created");
        Ok(CreateResult::Created(identifier))
    }

    async fn get_record(&self, owner: &PublicKeyX, salt: &Salt) -> Result<Option<AccountRecord>> {
        Ok(self.accounts.get(&(*owner, *salt)).map(|r| r.value().clone()))
    }

    async fn get_by_identifier(&self, identifier: &Address) -> Result<Option<AccountRecord>> {
        let key = match self.by_identifier.get(identifier) {
            Some(key) => *key.value(),
            None => return Ok(None),
        };
        Ok(self.accounts.get(&key).map(|r| r.value().clone()))
    }

    async fn list_by_owner(&self, owner: &PublicKeyX) -> Result<Vec<AccountRecord>> {
        let mut records: Vec<AccountRecord> = self
            .accounts
            .iter()
            .filter(|r| &r.key().0 == owner)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.salt.cmp(&b.salt));
        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.accounts.len() as u64)
    }

    async fn behavior(&self, identifier: &Address) -> Result<Option<BehaviorVersion>> {
        Ok(self.behaviors.get(identifier).map(|v| *v.value()))
    }

    async fn upgrade_behavior(&self, identifier: &Address, version: BehaviorVersion) -> Result<()> {
        let mut current = self
            .behaviors
            .get_mut(identifier)
            .ok_or(RegistryError::NotFound(*identifier))?;

        if version <= *current {
            return Err(RegistryError::StaleBehavior {
                identifier: *identifier,
                current: current.0,
                requested: version.0,
            });
        }

        let previous = *current;
        *current = version;
        info!(identifier = %identifier, from = %previous, to = %version, "behavior upgraded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materializer::MaterializeError;
    use nostr_account_core::{derive_identifier, ImplementationDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn make_test_owner(byte: u8) -> PublicKeyX {
        PublicKeyX::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let registry = MemoryRegistry::new();
        let owner = make_test_owner(0x42);
        let salt = Salt::from_u64(0);

        let first = registry.create_or_get(&owner, &salt).await.unwrap();
        let second = registry.create_or_get(&owner, &salt).await.unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.identifier(), second.identifier());
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prediction_matches_creation() {
        let registry = MemoryRegistry::new();
        let owner = make_test_owner(0x42);
        let salt = Salt::from_u64(5);

        let predicted = registry.get_address(&owner, &salt);
        assert_eq!(predicted, derive_identifier(&owner, &salt));
        assert!(registry.get_record(&owner, &salt).await.unwrap().is_none());

        let created = registry.create_or_get(&owner, &salt).await.unwrap();
        assert_eq!(created.identifier(), predicted);
    }

    #[tokio::test]
    async fn test_distinct_keys_distinct_accounts() {
        let registry = MemoryRegistry::new();
        let a = registry
            .create_or_get(&make_test_owner(1), &Salt::from_u64(0))
            .await
            .unwrap();
        let b = registry
            .create_or_get(&make_test_owner(1), &Salt::from_u64(1))
            .await
            .unwrap();
        let c = registry
            .create_or_get(&make_test_owner(2), &Salt::from_u64(0))
            .await
            .unwrap();

        assert!(a.is_new() && b.is_new() && c.is_new());
        assert_ne!(a.identifier(), b.identifier());
        assert_ne!(a.identifier(), c.identifier());
        assert_ne!(b.identifier(), c.identifier());
    }

    #[tokio::test]
    async fn test_zero_owner_rejected() {
        let registry = MemoryRegistry::new();
        let err = registry
            .create_or_get(&PublicKeyX::ZERO, &Salt::from_u64(0))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidOwner));
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lookups() {
        let registry = MemoryRegistry::new();
        let owner = make_test_owner(0x42);
        for i in [3u64, 1, 2] {
            registry.create_or_get(&owner, &Salt::from_u64(i)).await.unwrap();
        }
        registry
            .create_or_get(&make_test_owner(0x43), &Salt::from_u64(1))
            .await
            .unwrap();

        let listed = registry.list_by_owner(&owner).await.unwrap();
        let salts: Vec<Salt> = listed.iter().map(|r| r.salt).collect();
        assert_eq!(salts, vec![Salt::from_u64(1), Salt::from_u64(2), Salt::from_u64(3)]);

        let record = &listed[0];
        let by_id = registry.get_by_identifier(&record.identifier).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(record));
        assert!(registry
            .get_by_identifier(&Address::from_bytes([0; 20]))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_materialization_leaves_nothing() {
        let failing = |_: &crate::traits::AccountRecord| -> std::result::Result<(), MaterializeError> {
            Err("host rejected account".into())
        };
        let registry = MemoryRegistry::new().with_materializer(Arc::new(failing));
        let owner = make_test_owner(0x42);
        let salt = Salt::from_u64(0);

        let err = registry.create_or_get(&owner, &salt).await.unwrap_err();
        match err {
            RegistryError::CreationFailed { identifier, reason } => {
                assert_eq!(identifier, registry.get_address(&owner, &salt));
                assert!(reason.contains("host rejected"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(registry.get_record(&owner, &salt).await.unwrap().is_none());
        assert!(registry
            .behavior(&registry.get_address(&owner, &salt))
            .await
            .unwrap()
            .is_none());
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_materializer_called_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let materializer = move |_: &crate::traits::AccountRecord| -> std::result::Result<(), MaterializeError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        let registry = MemoryRegistry::new().with_materializer(Arc::new(materializer));

        let owner = make_test_owner(0x42);
        for _ in 0..3 {
            registry.create_or_get(&owner, &Salt::from_u64(0)).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_single_winner() {
        let registry = Arc::new(MemoryRegistry::new());
        let owner = make_test_owner(0x42);
        let salt = Salt::from_u64(9);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.create_or_get(&owner, &salt).await })
            })
            .collect();

        let mut created = 0;
        let mut ids = Vec::new();
        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            if result.is_new() {
                created += 1;
            }
            ids.push(result.identifier());
        }

        assert_eq!(created, 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_materializer_does_not_delay_other_keys() {
        let started = Arc::new(tokio::sync::Notify::new());
        let signal = started.clone();
        let materializer = move |record: &AccountRecord| -> std::result::Result<(), MaterializeError> {
            if record.salt == Salt::from_u64(0) {
                signal.notify_one();
                std::thread::sleep(Duration::from_millis(800));
            }
            Ok(())
        };
        let registry = Arc::new(MemoryRegistry::new().with_materializer(Arc::new(materializer)));
        let owner = make_test_owner(0x42);

        let slow = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.create_or_get(&owner, &Salt::from_u64(0)).await })
        };
        started.notified().await;

        let begun = Instant::now();
        let other = registry.create_or_get(&owner, &Salt::from_u64(1)).await.unwrap();
        assert!(other.is_new());
        assert!(begun.elapsed() < Duration::from_millis(400), "waited {:?}", begun.elapsed());

        // The slow key is still in flight, and its account is not visible yet.
        assert!(registry.get_record(&owner, &Salt::from_u64(0)).await.unwrap().is_none());
        assert!(slow.await.unwrap().unwrap().is_new());
        assert_eq!(registry.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_created_account_fully_indexed() {
        let registry = MemoryRegistry::new();
        let owner = make_test_owner(0x42);
        let id = registry
            .create_or_get(&owner, &Salt::from_u64(0))
            .await
            .unwrap()
            .identifier();

        assert!(registry.get_by_identifier(&id).await.unwrap().is_some());
        assert!(registry.behavior(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_behavior_upgrade() {
        let registry = MemoryRegistry::new();
        let owner = make_test_owner(0x42);
        let id = registry
            .create_or_get(&owner, &Salt::from_u64(0))
            .await
            .unwrap()
            .identifier();

        assert_eq!(registry.behavior(&id).await.unwrap(), Some(BehaviorVersion::INITIAL));

        registry.upgrade_behavior(&id, BehaviorVersion(2)).await.unwrap();
        assert_eq!(registry.behavior(&id).await.unwrap(), Some(BehaviorVersion(2)));

        let stale = registry.upgrade_behavior(&id, BehaviorVersion(2)).await.unwrap_err();
        assert!(matches!(
            stale,
            RegistryError::StaleBehavior { current: 2, requested: 2, .. }
        ));

        // Identity is untouched.
        assert_eq!(registry.get_address(&owner, &Salt::from_u64(0)), id);
    }

    #[tokio::test]
    async fn test_upgrade_unknown_account() {
        let registry = MemoryRegistry::new();
        let err = registry
            .upgrade_behavior(&Address::from_bytes([0x01; 20]), BehaviorVersion(2))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_custom_config() {
        let config = RegistryConfig {
            descriptor: ImplementationDescriptor::from_code(b"custom handle"),
            initial_behavior: BehaviorVersion(7),
        };
        let registry = MemoryRegistry::with_config(config);
        let owner = make_test_owner(0x42);
        let salt = Salt::from_u64(0);

        let id = registry.create_or_get(&owner, &salt).await.unwrap().identifier();
        assert_ne!(id, derive_identifier(&owner, &salt));
        assert_eq!(registry.behavior(&id).await.unwrap(), Some(BehaviorVersion(7)));
    }
}
