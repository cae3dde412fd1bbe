//! Storage assets and the consent record codec.
//!
//! A [`StorageAsset`] is the generic envelope the asset store persists. The
//! codec maps a [`ConsentRecord`] onto one: the whole record goes into
//! `private_data` (encrypted at rest by the store), nothing is public.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::record::ConsentRecord;
use crate::types::AssetId;

/// Namespace scoping consent asset identifiers.
pub const CONSENT_NAMESPACE: &str = "consent.Consent";

/// Name of the index table maintained for consent assets.
pub const CONSENT_INDEX_TABLE: &str = "Consent";

/// Primary key column of the consent index table.
pub const CONSENT_PRIMARY_KEY: &str = "Consent_ID";

/// JSON literal stored as public data when nothing is public.
const EMPTY_PUBLIC_DATA: &[u8] = b"null";

/// Generic asset envelope consumed by the asset store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAsset {
    /// Deterministic identifier (namespace + primary key).
    pub asset_id: AssetId,

    /// Unencrypted JSON payload.
    pub public_data: Bytes,

    /// JSON payload encrypted at rest. Plaintext while in transit to/from the store.
    pub private_data: Bytes,

    /// Secondary type tags.
    pub datatypes: Vec<String>,

    /// Index table the store updates on write.
    pub index_table: String,
}

/// Identifier of the asset holding the record with this `consent_id`.
pub fn asset_id_for(consent_id: &str) -> AssetId {
    AssetId::derive(CONSENT_NAMESPACE, consent_id)
}

/// Convert a consent record into a storage asset.
pub fn to_asset(record: &ConsentRecord) -> Result<StorageAsset, CodecError> {
    Ok(StorageAsset {
        asset_id: asset_id_for(&record.consent_id),
        public_data: Bytes::from_static(EMPTY_PUBLIC_DATA),
        private_data: Bytes::from(record.to_json()?),
        datatypes: Vec::new(),
        index_table: CONSENT_INDEX_TABLE.to_string(),
    })
}

/// Convert a (decrypted) storage asset back into a consent record.
pub fn from_asset(asset: &StorageAsset) -> Result<ConsentRecord, CodecError> {
    if asset.asset_id.namespace() != CONSENT_NAMESPACE {
        return Err(CodecError::InvalidRecord(format!(
            "asset {} is not in namespace {}",
            asset.asset_id, CONSENT_NAMESPACE
        )));
    }
    ConsentRecord::from_json(&asset.private_data)
}
