//! Database schema migrations for SQLite.
//!
//! Each migration transforms the schema from version N to N+1 and is
//! recorded in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{RegistryError, Result};
use crate::traits::now_millis;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(RegistryError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(RegistryError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: accounts, behaviors, registry metadata.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per created account; never updated or deleted
        CREATE TABLE accounts (
            identifier BLOB PRIMARY KEY,      -- 20 bytes, derived address
            owner BLOB NOT NULL,              -- 32 bytes, x-only public key
            salt BLOB NOT NULL,               -- 32 bytes
            created_at INTEGER NOT NULL,      -- Unix ms

            UNIQUE(owner, salt)
        );

        -- Behavior binding, kept apart from identity
        CREATE TABLE account_behaviors (
            identifier BLOB PRIMARY KEY REFERENCES accounts(identifier),
            version INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Registry-wide settings (e.g. the implementation descriptor)
        CREATE TABLE registry_meta (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );

        CREATE INDEX idx_accounts_owner ON accounts(owner, salt);
        "#,
    )?;

    Ok(())
}
