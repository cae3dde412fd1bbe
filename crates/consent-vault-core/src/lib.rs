//! # Consent Vault Core
//!
//! Pure primitives for Consent Vault: consent records, storage assets, index
//! table definitions, and pagination cursors.
//!
//! This crate contains no I/O, no storage, no encryption. It is pure
//! computation over the data shapes the rest of the workspace exchanges.
//!
//! ## Key Types
//!
//! - [`ConsentRecord`] - The domain record and its JSON wire contract
//! - [`StorageAsset`] - Generic envelope persisted by the asset store
//! - [`AssetId`] - Deterministic asset identifier (namespace + primary key)
//! - [`IndexTable`] - Primary key plus secondary index declarations
//! - [`IndexKey`] / [`Cursor`] - Ordered index keys and resumable cursors
//!
//! ## Asset Codec
//!
//! [`to_asset`] and [`from_asset`] map records to assets and back. See the
//! [`asset`] module.

pub mod asset;
pub mod cursor;
pub mod error;
pub mod index;
pub mod record;
pub mod types;

pub use asset::{
    asset_id_for, from_asset, to_asset, StorageAsset, CONSENT_INDEX_TABLE, CONSENT_NAMESPACE,
    CONSENT_PRIMARY_KEY,
};
pub use cursor::{Cursor, IndexKey};
pub use error::{CodecError, CursorError, IndexError};
pub use index::{IndexSpec, IndexTable};
pub use record::ConsentRecord;
pub use types::AssetId;
