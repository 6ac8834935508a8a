//! The Gateway: verify an authorization, then resolve or create its account.
//!
//! Brings together the Schnorr verifier, the canonical authentication event,
//! and an account registry behind one interface.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use nostr_account_core::{
    validate_authorization, validate_authorization_structure, Address, AuthenticatedEvent,
    AuthorizationRequest, ImplementationDescriptor, LiftPolicy, OperationDigest, PublicKeyX, Salt,
    SchnorrVerifier, Sha256Hash,
};
use nostr_account_registry::{
    AccountRecord, AccountRegistry, BehaviorVersion, MemoryRegistry, RegistryConfig,
    RegistryError, SqliteRegistry,
};

use crate::error::{GatewayError, Result};

/// Configuration for the Gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    /// How owner keys are lifted to curve points.
    pub lift_policy: LiftPolicy,
    /// Handle code addresses are derived against.
    pub descriptor: ImplementationDescriptor,
    /// Behavior bound to newly created accounts.
    pub initial_behavior: BehaviorVersion,
    /// Verify signatures in `authorize`. Disable only when requests were
    /// verified upstream; range checks still run.
    pub verify_before_create: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            lift_policy: LiftPolicy::Strict,
            descriptor: ImplementationDescriptor::DEFAULT,
            initial_behavior: BehaviorVersion::INITIAL,
            verify_before_create: true,
        }
    }
}

impl GatewayConfig {
    /// The matching registry configuration.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            descriptor: self.descriptor,
            initial_behavior: self.initial_behavior,
        }
    }
}

/// An account that a request was authorized against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedAccount {
    pub identifier: Address,
    pub owner: PublicKeyX,
    pub salt: Salt,
    /// True only if this request materialized the account.
    pub created: bool,
    /// Current behavior binding.
    pub behavior: BehaviorVersion,
    /// The operation the signature authorizes.
    pub operation_digest: OperationDigest,
    /// Hash of the authentication event that was signed.
    pub event_id: Sha256Hash,
}

/// The main Gateway struct.
///
/// Provides:
/// - Strict authorization (`authorize`) that names the failed check
/// - Tolerant probing (`probe`) that only answers yes or no
/// - Address prediction before any account exists
/// - Account queries and behavior upgrades
pub struct Gateway<R: AccountRegistry> {
    registry: Arc<R>,
    verifier: SchnorrVerifier,
    config: GatewayConfig,
}

impl Gateway<MemoryRegistry> {
    /// A gateway over a fresh in-memory registry.
    pub fn in_memory(config: GatewayConfig) -> Self {
        let registry = MemoryRegistry::with_config(config.registry_config());
        Self::from_parts(Arc::new(registry), config)
    }
}

impl Gateway<SqliteRegistry> {
    /// A gateway over a SQLite registry file.
    pub fn open(path: impl AsRef<Path>, config: GatewayConfig) -> Result<Self> {
        let registry = SqliteRegistry::open_with_config(path, config.registry_config())?;
        Ok(Self::from_parts(Arc::new(registry), config))
    }
}

impl<R: AccountRegistry> Gateway<R> {
    /// Create a gateway over an existing registry.
    ///
    /// Fails if the registry derives addresses against a different descriptor.
    pub fn new(registry: R, config: GatewayConfig) -> Result<Self> {
        Self::with_shared_registry(Arc::new(registry), config)
    }

    /// Like [`new`](Self::new), sharing the registry with other owners.
    pub fn with_shared_registry(registry: Arc<R>, config: GatewayConfig) -> Result<Self> {
        if registry.deriver().descriptor() != &config.descriptor {
            return Err(GatewayError::Config(format!(
                "registry descriptor {:?} differs from configured {:?}",
                registry.deriver().descriptor(),
                config.descriptor
            )));
        }
        Ok(Self::from_parts(registry, config))
    }

    fn from_parts(registry: Arc<R>, config: GatewayConfig) -> Self {
        Self {
            registry,
            verifier: SchnorrVerifier::new(config.lift_policy),
            config,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn verifier(&self) -> &SchnorrVerifier {
        &self.verifier
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Check a request's signature without touching the registry.
    pub fn verify(&self, request: &AuthorizationRequest) -> Result<AuthenticatedEvent> {
        Ok(validate_authorization(request, &self.verifier)?)
    }

    /// Tolerant form of [`verify`](Self::verify).
    pub fn probe(&self, request: &AuthorizationRequest) -> bool {
        let ok = validate_authorization(request, &self.verifier).is_ok();
        debug!(owner = %request.owner, ok, "probe");
        ok
    }

    /// The address the account for (owner, salt) has, or will have.
    pub fn predict_address(&self, owner: &PublicKeyX, salt: &Salt) -> Address {
        self.registry.get_address(owner, salt)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify a request, then resolve or create the account it controls.
    ///
    /// Nothing touches the registry unless verification succeeds.
    pub async fn authorize(&self, request: &AuthorizationRequest) -> Result<AuthorizedAccount> {
        let event = if self.config.verify_before_create {
            validate_authorization(request, &self.verifier).map_err(|e| {
                warn!(owner = %request.owner, error = %e, "authorization rejected");
                e
            })?
        } else {
            validate_authorization_structure(request)?;
            request.event()
        };

        let result = self
            .registry
            .create_or_get(&request.owner, &request.salt)
            .await?;
        let identifier = result.identifier();

        let behavior = self
            .registry
            .behavior(&identifier)
            .await?
            .ok_or(RegistryError::NotFound(identifier))?;

        info!(
            identifier = %identifier,
            owner = %request.owner,
            created = result.is_new(),
            "authorized"
        );

        Ok(AuthorizedAccount {
            identifier,
            owner: request.owner,
            salt: request.salt,
            created: result.is_new(),
            behavior,
            operation_digest: request.operation_digest,
            event_id: *event.id(),
        })
    }

    /// Decode a JSON request (as carried in a relay envelope) and authorize it.
    pub async fn authorize_json(&self, json: &str) -> Result<AuthorizedAccount> {
        let request: AuthorizationRequest = serde_json::from_str(json)?;
        self.authorize(&request).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Account Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the account for (owner, salt), if created.
    pub async fn account(&self, owner: &PublicKeyX, salt: &Salt) -> Result<Option<AccountRecord>> {
        Ok(self.registry.get_record(owner, salt).await?)
    }

    /// Get an account by identifier.
    pub async fn account_by_identifier(&self, identifier: &Address) -> Result<Option<AccountRecord>> {
        Ok(self.registry.get_by_identifier(identifier).await?)
    }

    /// All accounts of one owner.
    pub async fn accounts_of(&self, owner: &PublicKeyX) -> Result<Vec<AccountRecord>> {
        Ok(self.registry.list_by_owner(owner).await?)
    }

    /// Current behavior binding of an account.
    pub async fn behavior(&self, identifier: &Address) -> Result<Option<BehaviorVersion>> {
        Ok(self.registry.behavior(identifier).await?)
    }

    /// Rebind an account to a newer behavior. Its identifier stays the same.
    pub async fn upgrade_behavior(&self, identifier: &Address, version: BehaviorVersion) -> Result<()> {
        Ok(self.registry.upgrade_behavior(identifier, version).await?)
    }
}
