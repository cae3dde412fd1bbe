//! Store traits: the abstract interfaces for asset persistence and indexing.
//!
//! The record layer depends only on these traits. Implementations include
//! SQLite (primary) and in-memory (for tests).

use consent_vault_core::{AssetId, Cursor, IndexTable, StorageAsset};
use consent_vault_keys::{Caller, EncryptionKey};

use crate::error::Result;

/// What to do when an asset with the same id already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Fail with `AlreadyExists`.
    InsertOnly,
    /// Replace the existing asset, if the writer owns it.
    Upsert,
}

/// Result of writing an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// No asset existed under this id.
    Inserted,
    /// An existing asset was replaced.
    Replaced,
}

/// Equality filter on a leading index column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFilter {
    pub field: String,
    pub value: String,
}

/// A paged scan over one index of an index table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPageQuery {
    /// Only assets in this namespace are returned.
    pub namespace: String,
    /// Index table to scan.
    pub index_table: String,
    /// Index to walk, by name. `None` picks the first index matching `filters`.
    pub index: Option<String>,
    /// Filters on the leading columns of the chosen index, in column order.
    pub filters: Vec<AssetFilter>,
    /// Scan direction.
    pub ascending: bool,
    /// Resume point; empty for the first page.
    pub cursor: Cursor,
    /// Maximum number of assets to return.
    pub limit: usize,
}

impl AssetPageQuery {
    /// Ascending, unfiltered scan from the start.
    pub fn new(namespace: impl Into<String>, index_table: impl Into<String>, limit: usize) -> Self {
        Self {
            namespace: namespace.into(),
            index_table: index_table.into(),
            index: None,
            filters: Vec::new(),
            ascending: true,
            cursor: Cursor::start(),
            limit,
        }
    }

    /// Walk the index named `index` instead of selecting one from the filters.
    pub fn using_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Add a leading-column filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(AssetFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Scan in descending order.
    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    /// Resume after `cursor`.
    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }
}

/// One page of decrypted assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPage {
    /// Assets the caller can read, in index order.
    pub assets: Vec<StorageAsset>,
    /// Where the next page starts; empty when there are no more pages.
    pub next_cursor: Cursor,
}

/// The asset store: encrypted persistence with access control.
///
/// `private_data` is plaintext at this interface. The store encrypts it with
/// the writer's key and only hands it back to callers whose key owns it.
pub trait AssetStore: Send + Sync {
    /// Write an asset, sealing its private data with `key`.
    ///
    /// The asset's index table must already be declared; its index entries
    /// are replaced in the same transaction as the asset.
    fn add_asset(
        &self,
        caller: &Caller,
        asset: &StorageAsset,
        key: &EncryptionKey,
        policy: WritePolicy,
    ) -> Result<WriteResult>;

    /// Read one asset.
    ///
    /// Returns `AccessDenied` if it exists but the caller cannot read it.
    fn get_asset(&self, caller: &Caller, asset_id: &AssetId) -> Result<Option<StorageAsset>>;

    /// Read a page of assets the caller can see, in index order.
    ///
    /// Invisible assets are skipped and do not count toward the limit.
    fn get_asset_page(&self, caller: &Caller, query: &AssetPageQuery) -> Result<AssetPage>;
}

/// The index engine's catalog of table definitions.
pub trait IndexCatalogBackend: Send + Sync {
    /// The persisted definition of `name`, or a fresh empty one.
    ///
    /// Fails if the table exists with a different primary key.
    fn table(&self, name: &str, primary_key: &str) -> Result<IndexTable>;

    /// Persist a table definition. Returns `false` if nothing changed.
    fn save_table(&self, table: &IndexTable) -> Result<bool>;
}

impl<T: AssetStore + ?Sized> AssetStore for std::sync::Arc<T> {
    fn add_asset(
        &self,
        caller: &Caller,
        asset: &StorageAsset,
        key: &EncryptionKey,
        policy: WritePolicy,
    ) -> Result<WriteResult> {
        (**self).add_asset(caller, asset, key, policy)
    }

    fn get_asset(&self, caller: &Caller, asset_id: &AssetId) -> Result<Option<StorageAsset>> {
        (**self).get_asset(caller, asset_id)
    }

    fn get_asset_page(&self, caller: &Caller, query: &AssetPageQuery) -> Result<AssetPage> {
        (**self).get_asset_page(caller, query)
    }
}

impl<T: IndexCatalogBackend + ?Sized> IndexCatalogBackend for std::sync::Arc<T> {
    fn table(&self, name: &str, primary_key: &str) -> Result<IndexTable> {
        (**self).table(name, primary_key)
    }

    fn save_table(&self, table: &IndexTable) -> Result<bool> {
        (**self).save_table(table)
    }
}
