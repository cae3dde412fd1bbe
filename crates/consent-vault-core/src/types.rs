//! Strong type definitions for Consent Vault.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derive-key context for asset identifiers.
const ASSET_ID_CONTEXT: &str = "consent-vault v0 asset-id";

/// Identifier of a storage asset.
///
/// Computed as `Blake3-derive(namespace || 0x00 || key)`, so the same key in
/// the same namespace always addresses the same asset.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    namespace: String,
    digest: [u8; 32],
}

impl AssetId {
    /// Derive the asset identifier for `key` within `namespace`.
    pub fn derive(namespace: &str, key: &str) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(ASSET_ID_CONTEXT);
        hasher.update(namespace.as_bytes());
        hasher.update(&[0u8]);
        hasher.update(key.as_bytes());
        Self {
            namespace: namespace.to_string(),
            digest: *hasher.finalize().as_bytes(),
        }
    }

    /// Rebuild an identifier from its stored parts.
    pub fn from_parts(namespace: impl Into<String>, digest: [u8; 32]) -> Self {
        Self {
            namespace: namespace.into(),
            digest,
        }
    }

    /// The namespace this asset belongs to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The raw 32-byte digest.
    pub const fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Digest as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({}/{})", self.namespace, &self.to_hex()[..16])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.to_hex())
    }
}
