//! Hook for the ledger host that backs each account.

use std::sync::Arc;

use tracing::warn;

use crate::error::RegistryError;
use crate::traits::AccountRecord;

/// Error returned by a [`Materializer`].
pub type MaterializeError = Box<dyn std::error::Error + Send + Sync>;

/// Brings an account into existence on the host ledger.
///
/// Called exactly once per created account, before the record becomes
/// visible. Returning an error aborts the creation: the registry records
/// nothing and reports `CreationFailed`.
///
/// Runs on the blocking pool while the registry holds the lock of this one
/// (owner, salt); other keys proceed meanwhile. Implementations must not
/// call `create_or_get` for the same key.
pub trait Materializer: Send + Sync {
    fn materialize(&self, record: &AccountRecord) -> Result<(), MaterializeError>;
}

/// Accepts every account without side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMaterializer;

impl Materializer for NoopMaterializer {
    fn materialize(&self, _record: &AccountRecord) -> Result<(), MaterializeError> {
        Ok(())
    }
}

impl<F> Materializer for F
where
    F: Fn(&AccountRecord) -> Result<(), MaterializeError> + Send + Sync,
{
    fn materialize(&self, record: &AccountRecord) -> Result<(), MaterializeError> {
        self(record)
    }
}

/// Run the materializer off the async runtime, mapping failure to `CreationFailed`.
pub(crate) async fn materialize_blocking(
    materializer: &Arc<dyn Materializer>,
    record: &AccountRecord,
) -> crate::error::Result<()> {
    let materializer = materializer.clone();
    let owned = record.clone();
    let outcome = tokio::task::spawn_blocking(move || materializer.materialize(&owned)).await?;

    outcome.map_err(|e| {
        warn!(identifier = %record.identifier, owner = %record.owner, error = %e, "materialization failed");
        RegistryError::CreationFailed {
            identifier: record.identifier,
            reason: e.to_string(),
        }
    })
}
