//! # Consent Vault Store
//!
//! Encrypted asset persistence and the ordered index engine behind it.
//!
//! ## Overview
//!
//! Assets are written through the [`AssetStore`] trait: public data is kept
//! in the clear, private data is sealed with the writer's key, and one ordered
//! entry per declared index is maintained alongside. Index tables are declared
//! through [`IndexCatalogBackend`]. [`SqliteStore`] is the persistent backend;
//! [`MemoryStore`] has the same semantics for tests.
//!
//! ## Key Types
//!
//! - [`AssetStore`] - Write, read and page through assets
//! - [`IndexCatalogBackend`] - Load and save index table definitions
//! - [`AssetPageQuery`] / [`AssetPage`] - A paged index scan and its result
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use consent_vault_keys::KeyRing;
//! use consent_vault_store::{AssetPageQuery, AssetStore, IndexCatalogBackend, SqliteStore};
//!
//! let ring = Arc::new(KeyRing::new());
//! let store = SqliteStore::open("vault.db", ring.clone()).unwrap();
//!
//! let mut table = store.table("Consent", "Consent_ID").unwrap();
//! table.add_index(&["Name", "EventName", "Consent_ID"], false).unwrap();
//! store.save_table(&table).unwrap();
//!
//! // let query = AssetPageQuery::new("consent.Consent", "Consent", 10);
//! // let page = store.get_asset_page(&caller, &query);
//! ```
//!
//! ## Design Notes
//!
//! - **Owner-only visibility**: An asset is readable by the key that sealed it
//! - **Skipped, not counted**: Invisible assets never fill a page
//! - **Atomic writes**: An asset and its index entries change together

pub mod error;
pub mod index_key;
pub mod memory;
pub mod migration;
pub mod scan;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use index_key::{index_entries, IndexEntry};
pub use memory::MemoryStore;
pub use scan::{collect_page, ScanPlan};
pub use sqlite::SqliteStore;
pub use traits::{
    AssetFilter, AssetPage, AssetPageQuery, AssetStore, IndexCatalogBackend, WritePolicy,
    WriteResult,
};
