//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite behind a mutex; every write runs in a single transaction so an
//! asset and its index entries change together.

use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use consent_vault_core::{AssetId, IndexTable, StorageAsset};
use consent_vault_keys::{Caller, EncryptedPayload, EncryptionKey, KeyId, KeyResolver};

use crate::error::{Result, StoreError};
use crate::index_key::index_entries;
use crate::migration::{self, now_millis};
use crate::scan::{collect_page, ScanPlan};
use crate::traits::{
    AssetPage, AssetPageQuery, AssetStore, IndexCatalogBackend, WritePolicy, WriteResult,
};

const ASSET_COLUMNS: &str =
    "namespace, digest, index_table, datatypes, public_data, envelope, owner_key_id";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    keys: Arc<dyn KeyResolver>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>, keys: Arc<dyn KeyResolver>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            keys,
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory(keys: Arc<dyn KeyResolver>) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            keys,
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {}", e)))?;
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {}", e)))?;
        f(&mut conn)
    }
}

/// Primary key of an asset row: `namespace || 0x00 || digest`.
fn asset_key(asset_id: &AssetId) -> Vec<u8> {
    let mut key = Vec::with_capacity(asset_id.namespace().len() + 33);
    key.extend_from_slice(asset_id.namespace().as_bytes());
    key.push(0);
    key.extend_from_slice(asset_id.digest());
    key
}

/// An asset row as stored, still sealed.
struct AssetRow {
    asset_id: AssetId,
    index_table: String,
    datatypes: String,
    public_data: Vec<u8>,
    envelope: Vec<u8>,
    owner: Vec<u8>,
}

fn row_to_asset(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssetRow> {
    let namespace: String = row.get("namespace")?;
    let digest: Vec<u8> = row.get("digest")?;
    let digest: [u8; 32] = digest.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(1, "digest".into(), rusqlite::types::Type::Blob)
    })?;

    Ok(AssetRow {
        asset_id: AssetId::from_parts(namespace, digest),
        index_table: row.get("index_table")?,
        datatypes: row.get("datatypes")?,
        public_data: row.get("public_data")?,
        envelope: row.get("envelope")?,
        owner: row.get("owner_key_id")?,
    })
}

impl AssetRow {
    fn owner(&self) -> Result<KeyId> {
        KeyId::try_from(self.owner.as_slice())
            .map_err(|_| StoreError::InvalidData(format!("owner key id of {}", self.asset_id)))
    }

    /// Decrypt for a reader holding `key`, or `None` if the key does not own it.
    fn open(self, key: &EncryptionKey) -> Result<Option<StorageAsset>> {
        if self.owner()? != key.key_id() {
            return Ok(None);
        }
        self.decrypt(key).map(Some)
    }

    fn decrypt(self, key: &EncryptionKey) -> Result<StorageAsset> {
        let plaintext = EncryptedPayload::from_bytes(&self.envelope)?.open(key)?;
        let datatypes: Vec<String> = serde_json::from_str(&self.datatypes)
            .map_err(|e| StoreError::Serialization(format!("datatypes: {}", e)))?;

        Ok(StorageAsset {
            asset_id: self.asset_id,
            public_data: Bytes::from(self.public_data),
            private_data: Bytes::from(plaintext),
            datatypes,
            index_table: self.index_table,
        })
    }
}

fn load_table(conn: &Connection, name: &str) -> Result<Option<IndexTable>> {
    let definition: Option<String> = conn
        .query_row(
            "SELECT definition FROM index_tables WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    definition
        .map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| StoreError::InvalidData(format!("index table {}: {}", name, e)))
        })
        .transpose()
}

impl AssetStore for SqliteStore {
    fn add_asset(
        &self,
        _caller: &Caller,
        asset: &StorageAsset,
        key: &EncryptionKey,
        policy: WritePolicy,
    ) -> Result<WriteResult> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let table = load_table(&tx, &asset.index_table)?
                .ok_or_else(|| StoreError::UnknownIndexTable(asset.index_table.clone()))?;
            let entries = index_entries(&table, &asset.asset_id, &asset.private_data)?;
            let asset_key = asset_key(&asset.asset_id);

            let existing_owner: Option<Vec<u8>> = tx
                .query_row(
                    "SELECT owner_key_id FROM assets WHERE asset_key = ?1",
                    params![asset_key],
                    |row| row.get(0),
                )
                .optional()?;

            let result = match existing_owner {
                Some(_) if policy == WritePolicy::InsertOnly => {
                    return Err(StoreError::AlreadyExists(asset.asset_id.to_string()));
                }
                Some(owner) if owner.as_slice() != key.key_id().as_bytes() => {
                    return Err(StoreError::AccessDenied(format!(
                        "asset {} is owned by another key",
                        asset.asset_id
                    )));
                }
                Some(_) => WriteResult::Replaced,
                None => WriteResult::Inserted,
            };

            for entry in &entries {
                let Some(prefix) = &entry.unique_prefix else {
                    continue;
                };
                let clash: Option<Vec<u8>> = tx
                    .query_row(
                        "SELECT asset_key FROM index_entries
                         WHERE table_name = ?1 AND index_name = ?2
                           AND unique_prefix = ?3 AND asset_key != ?4
                         LIMIT 1",
                        params![table.name(), entry.index, prefix, asset_key],
                        |row| row.get(0),
                    )
                    .optional()?;
                if clash.is_some() {
                    return Err(StoreError::UniqueViolation {
                        table: table.name().to_string(),
                        index: entry.index.clone(),
                    });
                }
            }

            let envelope = EncryptedPayload::seal(&asset.private_data, key)?.to_bytes()?;
            let datatypes = serde_json::to_string(&asset.datatypes)
                .map_err(|e| StoreError::Serialization(format!("datatypes: {}", e)))?;
            let now = now_millis();

            tx.execute(
                "INSERT INTO assets (
                    asset_key, namespace, digest, index_table, datatypes,
                    public_data, envelope, owner_key_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                ON CONFLICT(asset_key) DO UPDATE SET
                    index_table = excluded.index_table,
                    datatypes = excluded.datatypes,
                    public_data = excluded.public_data,
                    envelope = excluded.envelope,
                    updated_at = excluded.updated_at",
                params![
                    asset_key,
                    asset.asset_id.namespace(),
                    asset.asset_id.digest().as_slice(),
                    asset.index_table,
                    datatypes,
                    asset.public_data.as_ref(),
                    envelope,
                    key.key_id().as_bytes().as_slice(),
                    now,
                ],
            )?;

            tx.execute(
                "DELETE FROM index_entries WHERE asset_key = ?1",
                params![asset_key],
            )?;
            for entry in &entries {
                tx.execute(
                    "INSERT INTO index_entries (
                        table_name, index_name, sort_key, unique_prefix, asset_key
                    ) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![table.name(), entry.index, entry.key, entry.unique_prefix, asset_key],
                )?;
            }

            tx.commit()?;
            tracing::debug!(asset_id = %asset.asset_id, ?result, "sqlite store wrote asset");
            Ok(result)
        })
    }

    fn get_asset(&self, caller: &Caller, asset_id: &AssetId) -> Result<Option<StorageAsset>> {
        let key = self.keys.sym_key(caller)?;

        let row = self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM assets WHERE asset_key = ?1", ASSET_COLUMNS),
                params![asset_key(asset_id)],
                row_to_asset,
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.open(&key)?.map(Some).ok_or_else(|| {
            StoreError::AccessDenied(format!("{} cannot read {}", caller, asset_id))
        })
    }

    fn get_asset_page(&self, caller: &Caller, query: &AssetPageQuery) -> Result<AssetPage> {
        let key = self.keys.sym_key(caller)?;

        let page = self.with_conn(|conn| {
            let table = load_table(conn, &query.index_table)?
                .ok_or_else(|| StoreError::UnknownIndexTable(query.index_table.clone()))?;
            let plan = ScanPlan::new(&table, query)?;

            let mut sql = String::from(
                "SELECT sort_key, asset_key FROM index_entries
                 WHERE table_name = ?1 AND index_name = ?2",
            );
            let mut args = vec![
                Value::Text(query.index_table.clone()),
                Value::Text(plan.index.clone()),
            ];
            for (bound, lower) in [(&plan.lower, true), (&plan.upper, false)] {
                let (op, value) = match (bound, lower) {
                    (std::ops::Bound::Included(v), true) => (">=", v),
                    (std::ops::Bound::Excluded(v), true) => (">", v),
                    (std::ops::Bound::Included(v), false) => ("<=", v),
                    (std::ops::Bound::Excluded(v), false) => ("<", v),
                    (std::ops::Bound::Unbounded, _) => continue,
                };
                args.push(Value::Blob(value.clone()));
                sql.push_str(&format!(" AND sort_key {} ?{}", op, args.len()));
            }
            sql.push_str(if plan.ascending {
                " ORDER BY sort_key ASC"
            } else {
                " ORDER BY sort_key DESC"
            });

            let mut scan = conn.prepare(&sql)?;
            let mut load = conn.prepare(&format!(
                "SELECT {} FROM assets WHERE asset_key = ?1",
                ASSET_COLUMNS
            ))?;

            let mut namespace_prefix = query.namespace.as_bytes().to_vec();
            namespace_prefix.push(0);

            let entries = scan
                .query_map(params_from_iter(args.iter()), |row| {
                    Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
                })?
                .map(|entry| entry.map_err(StoreError::from));

            let owner = key.key_id();
            collect_page(
                &plan,
                entries,
                |asset_key| {
                    if !asset_key.starts_with(&namespace_prefix) {
                        return Ok(None);
                    }
                    let row = load
                        .query_row(params![asset_key], row_to_asset)
                        .optional()?
                        .ok_or_else(|| {
                            StoreError::InvalidData(
                                "index entry points at missing asset".to_string(),
                            )
                        })?;
                    Ok((row.owner()? == owner).then_some(row))
                },
                |_, row| row.decrypt(&key),
            )
        })?;

        tracing::debug!(
            table = %query.index_table,
            count = page.assets.len(),
            has_more = !page.next_cursor.is_empty(),
            "sqlite store served page"
        );
        Ok(page)
    }
}

impl IndexCatalogBackend for SqliteStore {
    fn table(&self, name: &str, primary_key: &str) -> Result<IndexTable> {
        let requested = IndexTable::new(name, primary_key);
        match self.with_conn(|conn| load_table(conn, name))? {
            Some(existing) => {
                existing.check_compatible(&requested)?;
                Ok(existing)
            }
            None => Ok(requested),
        }
    }

    fn save_table(&self, table: &IndexTable) -> Result<bool> {
        let changed = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(existing) = load_table(&tx, table.name())? {
                existing.check_compatible(table)?;
                if existing == *table {
                    return Ok(false);
                }
                let populated: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM index_entries WHERE table_name = ?1)",
                    params![table.name()],
                    |row| row.get(0),
                )?;
                if populated {
                    return Err(StoreError::PopulatedTable(table.name().to_string()));
                }
            }

            let definition = serde_json::to_string(table)
                .map_err(|e| StoreError::Serialization(format!("index table: {}", e)))?;
            tx.execute(
                "INSERT INTO index_tables (name, primary_key, definition, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO UPDATE SET
                    definition = excluded.definition,
                    updated_at = excluded.updated_at",
                params![table.name(), table.primary_key_id(), definition, now_millis()],
            )?;
            tx.commit()?;
            Ok(true)
        })?;

        if changed {
            tracing::info!(
                table = table.name(),
                indexes = table.indexes().len(),
                "index table saved"
            );
        }
        Ok(changed)
    }
}
