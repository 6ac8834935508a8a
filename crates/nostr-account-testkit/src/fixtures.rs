//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nostr_account_core::{Address, AuthorizationRequest, OperationDigest, PublicKeyX, Salt};
use nostr_account_registry::{
    AccountRecord, AccountRegistry, MaterializeError, Materializer, MemoryRegistry,
};

use crate::signer::TestSigner;

/// A test fixture with a signer and an in-memory registry.
pub struct TestFixture {
    pub signer: TestSigner,
    pub registry: MemoryRegistry,
}

impl TestFixture {
    /// Create a new test fixture with a random signer.
    pub fn new() -> Self {
        Self {
            signer: TestSigner::random(),
            registry: MemoryRegistry::new(),
        }
    }

    /// Create with a deterministic signer.
    pub fn with_secret(secret: u64) -> Self {
        Self {
            signer: TestSigner::from_u64(secret),
            registry: MemoryRegistry::new(),
        }
    }

    /// Get the signer's public key.
    pub fn owner(&self) -> PublicKeyX {
        self.signer.public_key()
    }

    /// A signed request for the given salt over `sha256(operation)`.
    pub fn request(&self, salt: u64, operation: &[u8]) -> AuthorizationRequest {
        self.signer
            .authorize(Salt::from_u64(salt), OperationDigest::hash(operation))
    }

    /// Identifier the account at `salt` will have.
    pub fn predicted(&self, salt: u64) -> Address {
        self.registry
            .get_address(&self.owner(), &Salt::from_u64(salt))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple fixtures with distinct deterministic signers.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (1..=count as u64).map(TestFixture::with_secret).collect()
}

/// Materializer that always fails, counting how often it was asked.
#[derive(Debug, Default)]
pub struct FailingMaterializer {
    reason: String,
    calls: AtomicUsize,
}

impl FailingMaterializer {
    pub fn new(reason: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reason: reason.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Materializer for FailingMaterializer {
    fn materialize(&self, _record: &AccountRecord) -> Result<(), MaterializeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.reason.clone().into())
    }
}

/// Materializer that records every account it is asked to create.
#[derive(Debug, Default)]
pub struct RecordingMaterializer {
    records: Mutex<Vec<AccountRecord>>,
}

impl RecordingMaterializer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Identifiers materialized so far, in call order.
    pub fn identifiers(&self) -> Vec<Address> {
        match self.records.lock() {
            Ok(records) => records.iter().map(|r| r.identifier).collect(),
            Err(poisoned) => poisoned.into_inner().iter().map(|r| r.identifier).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.identifiers().len()
    }
}

impl Materializer for RecordingMaterializer {
    fn materialize(&self, record: &AccountRecord) -> Result<(), MaterializeError> {
        let mut records = self.records.lock().map_err(|e| e.to_string())?;
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_account_core::{validate_authorization, SchnorrVerifier};
    use nostr_account_registry::RegistryError;

    #[tokio::test]
    async fn test_fixture_account_creation() {
        let fixture = TestFixture::with_secret(3);
        let result = fixture
            .registry
            .create_or_get(&fixture.owner(), &Salt::from_u64(0))
            .await
            .unwrap();

        assert!(result.is_new());
        assert_eq!(result.identifier(), fixture.predicted(0));
    }

    #[tokio::test]
    async fn test_fixture_requests_validate() {
        let fixture = TestFixture::new();
        let request = fixture.request(7, b"transfer:100");

        let event = validate_authorization(&request, &SchnorrVerifier::strict()).unwrap();
        assert_eq!(event.owner(), &fixture.owner());
        assert_eq!(event.digest(), &OperationDigest::hash(b"transfer:100"));
    }

    #[tokio::test]
    async fn test_multi_party() {
        let parties = multi_party_fixtures(3);

        // Each party has unique keys and addresses
        let owners: Vec<_> = parties.iter().map(|p| p.owner()).collect();
        assert_ne!(owners[0], owners[1]);
        assert_ne!(owners[1], owners[2]);
        assert_ne!(parties[0].predicted(0), parties[1].predicted(0));
    }

    #[tokio::test]
    async fn test_failing_materializer() {
        let failing = FailingMaterializer::new("ledger offline");
        let registry = MemoryRegistry::new().with_materializer(failing.clone());
        let owner = TestSigner::from_u64(1).public_key();

        let err = registry
            .create_or_get(&owner, &Salt::from_u64(0))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::CreationFailed { .. }));
        assert_eq!(failing.calls(), 1);
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recording_materializer() {
        let recording = RecordingMaterializer::new();
        let registry = MemoryRegistry::new().with_materializer(recording.clone());
        let owner = TestSigner::from_u64(2).public_key();

        let first = registry.create_or_get(&owner, &Salt::from_u64(0)).await.unwrap();
        registry.create_or_get(&owner, &Salt::from_u64(0)).await.unwrap();
        registry.create_or_get(&owner, &Salt::from_u64(1)).await.unwrap();

        assert_eq!(recording.count(), 2);
        assert_eq!(recording.identifiers()[0], first.identifier());
    }
}
