//! Database schema migrations for SQLite.
//!
//! Each migration is a SQL batch that moves the schema from version N to
//! N+1. Applied versions are recorded in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: running it against an up-to-date database does nothing.
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
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
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
        tracing::info!(from = current, to = CURRENT_VERSION, "schema migrated");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: assets, index catalog, index entries.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Assets: public data in the clear, private data sealed
        CREATE TABLE assets (
            asset_key BLOB PRIMARY KEY,       -- namespace || 0x00 || digest
            namespace TEXT NOT NULL,
            digest BLOB NOT NULL,             -- 32 bytes
            index_table TEXT NOT NULL,
            datatypes TEXT NOT NULL,          -- JSON array of strings
            public_data BLOB NOT NULL,
            envelope BLOB NOT NULL,           -- CBOR EncryptedPayload
            owner_key_id BLOB NOT NULL,       -- 32 bytes, id of the sealing key
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Declared index tables
        CREATE TABLE index_tables (
            name TEXT PRIMARY KEY,
            primary_key TEXT NOT NULL,
            definition TEXT NOT NULL,         -- JSON IndexTable
            updated_at INTEGER NOT NULL
        );

        -- Ordered index entries
        CREATE TABLE index_entries (
            table_name TEXT NOT NULL,
            index_name TEXT NOT NULL,
            sort_key BLOB NOT NULL,           -- encoded column tuple || digest
            unique_prefix BLOB,               -- column tuple, unique indexes only
            asset_key BLOB NOT NULL,
            PRIMARY KEY (table_name, index_name, sort_key)
        );

        CREATE INDEX idx_index_entries_asset ON index_entries(asset_key);
        CREATE INDEX idx_index_entries_unique
            ON index_entries(table_name, index_name, unique_prefix);
        "#,
    )?;

    Ok(())
}

pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
