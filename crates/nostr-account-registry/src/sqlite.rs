//! SQLite implementation of the AccountRegistry trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`. One connection behind a mutex, held for one
//! statement or short transaction at a time. `create_or_get` is serialized
//! per key by an async lock; the materializer runs outside the connection.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use nostr_account_core::{AccountDeriver, Address, PublicKeyX, Salt};

use crate::error::{RegistryError, Result};
use crate::locks::KeyLocks;
use crate::materializer::{materialize_blocking, Materializer, NoopMaterializer};
use crate::migration;
use crate::traits::{
    now_millis, AccountRecord, AccountRegistry, BehaviorVersion, CreateResult, RegistryConfig,
};

const DESCRIPTOR_KEY: &str = "implementation_descriptor";

/// SQLite-based registry.
pub struct SqliteRegistry {
    conn: Arc<Mutex<Connection>>,
    config: RegistryConfig,
    deriver: AccountDeriver,
    materializer: Arc<dyn Materializer>,
    creating: KeyLocks<(PublicKeyX, Salt)>,
}

impl SqliteRegistry {
    /// Open a SQLite database at the given path with the default configuration.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, RegistryConfig::default())
    }

    /// Open a database file with a custom configuration.
    ///
    /// Fails with `InvalidData` if the file was created with a different
    /// implementation descriptor: its stored identifiers would no longer
    /// match `get_address`.
    pub fn open_with_config(path: impl AsRef<Path>, config: RegistryConfig) -> Result<Self> {
        Self::from_connection(Connection::open(path)?, config)
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        Self::open_memory_with_config(RegistryConfig::default())
    }

    pub fn open_memory_with_config(config: RegistryConfig) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, config)
    }

    fn from_connection(mut conn: Connection, config: RegistryConfig) -> Result<Self> {
        migration::migrate(&mut conn)?;
        check_descriptor(&conn, &config)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            deriver: config.deriver(),
            config,
            materializer: Arc::new(NoopMaterializer),
            creating: KeyLocks::new(),
        })
    }

    /// Replace the materializer invoked on creation.
    pub fn with_materializer(mut self, materializer: Arc<dyn Materializer>) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        RegistryError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

/// Record the descriptor on first open; reject a different one afterwards.
fn check_descriptor(conn: &Connection, config: &RegistryConfig) -> Result<()> {
    let stored: Option<Vec<u8>> = conn
        .query_row(
            "SELECT value FROM registry_meta WHERE key = ?1",
            params![DESCRIPTOR_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => {
            conn.execute(
                "INSERT INTO registry_meta (key, value) VALUES (?1, ?2)",
                params![DESCRIPTOR_KEY, config.descriptor.as_bytes().as_slice()],
            )?;
            Ok(())
        }
        Some(bytes) if bytes.as_slice() == config.descriptor.as_bytes() => Ok(()),
        Some(bytes) => Err(RegistryError::InvalidData(format!(
            "registry was created with descriptor {}, not {}",
            hex::encode(&bytes),
            config.descriptor.to_hex()
        ))),
    }
}

fn select_identifier(
    conn: &Connection,
    owner: &PublicKeyX,
    salt: &Salt,
) -> rusqlite::Result<Option<Address>> {
    conn.query_row(
        "SELECT identifier FROM accounts WHERE owner = ?1 AND salt = ?2",
        params![owner.as_bytes().as_slice(), salt.as_bytes().as_slice()],
        |row| blob(row, 0, "identifier").map(Address::from_bytes),
    )
    .optional()
}

fn blob<const N: usize>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    name: &str,
) -> rusqlite::Result<[u8; N]> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, name.into(), rusqlite::types::Type::Blob))
}

const RECORD_COLUMNS: &str = "identifier, owner, salt, created_at";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        identifier: Address::from_bytes(blob(row, 0, "identifier")?),
        owner: PublicKeyX::from_bytes(blob(row, 1, "owner")?),
        salt: Salt::from_bytes(blob(row, 2, "salt")?),
        created_at: row.get(3)?,
    })
}

#[async_trait]
impl AccountRegistry for SqliteRegistry {
    fn deriver(&self) -> &AccountDeriver {
        &self.deriver
    }

    async fn create_or_get(&self, owner: &PublicKeyX, salt: &Salt) -> Result<CreateResult> {
        if owner.is_zero() {
            return Err(RegistryError::InvalidOwner);
        }

        let owner = *owner;
        let salt = *salt;

        // Serialize creators of this key only. The connection mutex is held
        // for single statements, never across the materializer.
        let _guard = self.creating.lock(&(owner, salt)).await;

        if let Some(existing) = self
            .run(move |conn| Ok(select_identifier(conn, &owner, &salt)?))
            .await?
        {
            debug!(identifier = %existing, "account already exists");
            return Ok(CreateResult::Existing(existing));
        }

        let record = AccountRecord {
            identifier: self.deriver.derive(&owner, &salt),
            owner,
            salt,
            created_at: now_millis(),
        };
        materialize_blocking(&self.materializer, &record).await?;

        let initial_behavior = self.config.initial_behavior;
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // Another process sharing the file may have won the race.
            if let Some(existing) = select_identifier(&tx, &owner, &salt)? {
                debug!(identifier = %existing, "account created concurrently");
                return Ok(CreateResult::Existing(existing));
            }

            let identifier = record.identifier;
            tx.execute(
                "INSERT INTO accounts (identifier, owner, salt, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    identifier.as_bytes().as_slice(),
                    owner.as_bytes().as_slice(),
                    salt.as_bytes().as_slice(),
                    record.created_at,
                ],
            )?;
            tx.execute(
                "INSERT INTO account_behaviors (identifier, version, updated_at)
                 VALUES (?1, ?2, ?3)",
                params![identifier.as_bytes().as_slice(), initial_behavior.0, record.created_at],
            )?;
            tx.commit()?;

            info!(identifier = %identifier, owner = %owner, "account created");
            Ok(CreateResult::Created(identifier))
        })
        .await
    }

    async fn get_record(&self, owner: &PublicKeyX, salt: &Salt) -> Result<Option<AccountRecord>> {
        let owner = *owner;
        let salt = *salt;
        self.run(move |conn| {
            let record = conn
                .query_row(
                    &format!(
                        "SELECT {RECORD_COLUMNS} FROM accounts WHERE owner = ?1 AND salt = ?2"
                    ),
                    params![owner.as_bytes().as_slice(), salt.as_bytes().as_slice()],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn get_by_identifier(&self, identifier: &Address) -> Result<Option<AccountRecord>> {
        let identifier = *identifier;
        self.run(move |conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM accounts WHERE identifier = ?1"),
                    params![identifier.as_bytes().as_slice()],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn list_by_owner(&self, owner: &PublicKeyX) -> Result<Vec<AccountRecord>> {
        let owner = *owner;
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM accounts WHERE owner = ?1 ORDER BY salt"
            ))?;
            let records = stmt
                .query_map(params![owner.as_bytes().as_slice()], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn behavior(&self, identifier: &Address) -> Result<Option<BehaviorVersion>> {
        let identifier = *identifier;
        self.run(move |conn| {
            let version: Option<u32> = conn
                .query_row(
                    "SELECT version FROM account_behaviors WHERE identifier = ?1",
                    params![identifier.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(version.map(BehaviorVersion))
        })
        .await
    }

    async fn upgrade_behavior(&self, identifier: &Address, version: BehaviorVersion) -> Result<()> {
        let identifier = *identifier;
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current: u32 = tx
                .query_row(
                    "SELECT version FROM account_behaviors WHERE identifier = ?1",
                    params![identifier.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(RegistryError::NotFound(identifier))?;

            if version.0 <= current {
                return Err(RegistryError::StaleBehavior {
                    identifier,
                    current,
                    requested: version.0,
                });
            }

            tx.execute(
                "UPDATE account_behaviors SET version = ?1, updated_at = ?2 WHERE identifier = ?3",
                params![version.0, now_millis(), identifier.as_bytes().as_slice()],
            )?;
            tx.commit()?;

            info!(identifier = %identifier, from = current, to = %version, "behavior upgraded");
            Ok(())
        })
        .await
    }
}
