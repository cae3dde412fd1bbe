//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;

use consent_vault_core::{AssetId, IndexTable, StorageAsset};
use consent_vault_keys::{Caller, EncryptedPayload, EncryptionKey, KeyId, KeyResolver};

use crate::error::{Result, StoreError};
use crate::index_key::{index_entries, prefix_end, IndexEntry};
use crate::scan::{collect_page, ScanPlan};
use crate::traits::{
    AssetPage, AssetPageQuery, AssetStore, IndexCatalogBackend, WritePolicy, WriteResult,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    keys: Arc<dyn KeyResolver>,
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Assets indexed by ID.
    assets: HashMap<AssetId, StoredAsset>,

    /// Declared index tables by name.
    tables: HashMap<String, IndexTable>,

    /// Ordered entries: (table, index) -> entry key -> asset.
    entries: HashMap<(String, String), BTreeMap<Vec<u8>, AssetId>>,
}

struct StoredAsset {
    public_data: Bytes,
    envelope: EncryptedPayload,
    owner: KeyId,
    datatypes: Vec<String>,
    index_table: String,
    entries: Vec<IndexEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store resolving caller keys with `keys`.
    pub fn new(keys: Arc<dyn KeyResolver>) -> Self {
        Self {
            keys,
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Number of stored assets, regardless of owner.
    ///
    /// A poisoned lock is read through rather than reported as empty.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .assets
            .len()
    }

    /// True when no asset is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StoredAsset {
    /// Decrypt for a reader holding `key`, or `None` if the key does not own it.
    fn open(&self, asset_id: &AssetId, key: &EncryptionKey) -> Result<Option<StorageAsset>> {
        if self.owner != key.key_id() {
            return Ok(None);
        }
        self.decrypt(asset_id, key).map(Some)
    }

    fn decrypt(&self, asset_id: &AssetId, key: &EncryptionKey) -> Result<StorageAsset> {
        let plaintext = self.envelope.open(key)?;
        Ok(StorageAsset {
            asset_id: asset_id.clone(),
            public_data: self.public_data.clone(),
            private_data: Bytes::from(plaintext),
            datatypes: self.datatypes.clone(),
            index_table: self.index_table.clone(),
        })
    }
}

impl MemoryStoreInner {
    fn check_unique(&self, table: &str, asset_id: &AssetId, entries: &[IndexEntry]) -> Result<()> {
        for entry in entries {
            let Some(prefix) = &entry.unique_prefix else {
                continue;
            };
            let Some(index) = self.entries.get(&(table.to_string(), entry.index.clone())) else {
                continue;
            };
            let end = prefix_end(prefix);
            let clash = index
                .range(prefix.clone()..end)
                .any(|(_, other)| other != asset_id);
            if clash {
                return Err(StoreError::UniqueViolation {
                    table: table.to_string(),
                    index: entry.index.clone(),
                });
            }
        }
        Ok(())
    }

    fn remove_entries(&mut self, table: &str, asset_id: &AssetId, entries: &[IndexEntry]) {
        for entry in entries {
            if let Some(index) = self.entries.get_mut(&(table.to_string(), entry.index.clone())) {
                if index.get(&entry.key) == Some(asset_id) {
                    index.remove(&entry.key);
                }
            }
        }
    }

    fn insert_entries(&mut self, table: &str, asset_id: &AssetId, entries: &[IndexEntry]) {
        for entry in entries {
            self.entries
                .entry((table.to_string(), entry.index.clone()))
                .or_default()
                .insert(entry.key.clone(), asset_id.clone());
        }
    }

    fn table_has_entries(&self, table: &str) -> bool {
        self.entries
            .iter()
            .any(|((t, _), index)| t == table && !index.is_empty())
    }
}

impl AssetStore for MemoryStore {
    fn add_asset(
        &self,
        _caller: &Caller,
        asset: &StorageAsset,
        key: &EncryptionKey,
        policy: WritePolicy,
    ) -> Result<WriteResult> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        let table = inner
            .tables
            .get(&asset.index_table)
            .ok_or_else(|| StoreError::UnknownIndexTable(asset.index_table.clone()))?;
        let entries = index_entries(table, &asset.asset_id, &asset.private_data)?;

        let result = match inner.assets.get(&asset.asset_id) {
            Some(_) if policy == WritePolicy::InsertOnly => {
                return Err(StoreError::AlreadyExists(asset.asset_id.to_string()));
            }
            Some(existing) if existing.owner != key.key_id() => {
                return Err(StoreError::AccessDenied(format!(
                    "asset {} is owned by another key",
                    asset.asset_id
                )));
            }
            Some(_) => WriteResult::Replaced,
            None => WriteResult::Inserted,
        };

        inner.check_unique(&asset.index_table, &asset.asset_id, &entries)?;
        let envelope = EncryptedPayload::seal(&asset.private_data, key)?;

        if let Some(previous) = inner.assets.remove(&asset.asset_id) {
            inner.remove_entries(&previous.index_table, &asset.asset_id, &previous.entries);
        }
        inner.insert_entries(&asset.index_table, &asset.asset_id, &entries);
        inner.assets.insert(
            asset.asset_id.clone(),
            StoredAsset {
                public_data: asset.public_data.clone(),
                envelope,
                owner: key.key_id(),
                datatypes: asset.datatypes.clone(),
                index_table: asset.index_table.clone(),
                entries,
            },
        );

        tracing::debug!(asset_id = %asset.asset_id, ?result, "memory store wrote asset");
        Ok(result)
    }

    fn get_asset(&self, caller: &Caller, asset_id: &AssetId) -> Result<Option<StorageAsset>> {
        let key = self.keys.sym_key(caller)?;
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        match inner.assets.get(asset_id) {
            None => Ok(None),
            Some(stored) => stored.open(asset_id, &key)?.map(Some).ok_or_else(|| {
                StoreError::AccessDenied(format!("{} cannot read {}", caller, asset_id))
            }),
        }
    }

    fn get_asset_page(&self, caller: &Caller, query: &AssetPageQuery) -> Result<AssetPage> {
        let key = self.keys.sym_key(caller)?;
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        let table = inner
            .tables
            .get(&query.index_table)
            .ok_or_else(|| StoreError::UnknownIndexTable(query.index_table.clone()))?;
        let plan = ScanPlan::new(table, query)?;

        let index = inner
            .entries
            .get(&(query.index_table.clone(), plan.index.clone()));
        let scanned: Box<dyn Iterator<Item = (&Vec<u8>, &AssetId)> + '_> = match index {
            Some(index) if !plan.is_empty_range() => {
                let range = index.range((plan.lower.clone(), plan.upper.clone()));
                if plan.ascending {
                    Box::new(range)
                } else {
                    Box::new(range.rev())
                }
            }
            _ => Box::new(std::iter::empty()),
        };

        let owner = key.key_id();
        let entries = scanned.map(|(k, id)| Ok((k.clone(), id.clone())));
        let page = collect_page(
            &plan,
            entries,
            |asset_id| {
                if asset_id.namespace() != query.namespace {
                    return Ok(None);
                }
                match inner.assets.get(asset_id) {
                    Some(stored) => Ok((stored.owner == owner).then_some(stored)),
                    None => Err(StoreError::InvalidData(format!(
                        "index entry points at missing asset {}",
                        asset_id
                    ))),
                }
            },
            |asset_id, stored| stored.decrypt(asset_id, &key),
        )?;

        tracing::debug!(
            table = %query.index_table,
            count = page.assets.len(),
            has_more = !page.next_cursor.is_empty(),
            "memory store served page"
        );
        Ok(page)
    }
}

impl IndexCatalogBackend for MemoryStore {
    fn table(&self, name: &str, primary_key: &str) -> Result<IndexTable> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        let requested = IndexTable::new(name, primary_key);
        match inner.tables.get(name) {
            Some(existing) => {
                existing.check_compatible(&requested)?;
                Ok(existing.clone())
            }
            None => Ok(requested),
        }
    }

    fn save_table(&self, table: &IndexTable) -> Result<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        if let Some(existing) = inner.tables.get(table.name()) {
            existing.check_compatible(table)?;
            if existing == table {
                return Ok(false);
            }
            if inner.table_has_entries(table.name()) {
                return Err(StoreError::PopulatedTable(table.name().to_string()));
            }
        }

        inner.tables.insert(table.name().to_string(), table.clone());
        tracing::info!(
            table = table.name(),
            indexes = table.indexes().len(),
            "index table saved"
        );
        Ok(true)
    }
}
