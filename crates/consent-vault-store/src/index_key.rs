//! Index entry extraction.
//!
//! When an asset is written, its plaintext private data is parsed as a JSON
//! object and one entry is produced per index of the asset's table. Column
//! values become tuple components: strings verbatim, anything else by its
//! JSON text. The asset digest is appended as a final component, so entry
//! keys are unique even for non-unique indexes.

use consent_vault_core::{AssetId, IndexKey, IndexTable};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::traits::AssetFilter;

/// One index entry for an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Name of the index this entry belongs to.
    pub index: String,
    /// Full entry key: column tuple followed by the asset digest.
    pub key: Vec<u8>,
    /// Column tuple alone, set for unique indexes.
    pub unique_prefix: Option<Vec<u8>>,
}

/// Compute every index entry for an asset written to `table`.
pub fn index_entries(
    table: &IndexTable,
    asset_id: &AssetId,
    private_data: &[u8],
) -> Result<Vec<IndexEntry>> {
    let doc: Value = serde_json::from_slice(private_data)
        .map_err(|e| StoreError::Serialization(format!("asset {}: {}", asset_id, e)))?;
    let object = doc.as_object().ok_or_else(|| {
        StoreError::Serialization(format!(
            "asset {}: private data is not a JSON object",
            asset_id
        ))
    })?;

    table
        .all_indexes()
        .into_iter()
        .map(|spec| {
            let values = spec
                .columns
                .iter()
                .map(|column| column_value(table.name(), object, column))
                .collect::<Result<Vec<_>>>()?;

            let tuple = IndexKey::encode(&values);
            let mut key = tuple.clone();
            key.push(asset_id.digest());

            Ok(IndexEntry {
                index: spec.name(),
                key: key.into_bytes(),
                unique_prefix: spec.unique.then(|| tuple.into_bytes()),
            })
        })
        .collect()
}

/// Encoded prefix matching the given leading-column filters.
pub fn filter_prefix(filters: &[AssetFilter]) -> Option<Vec<u8>> {
    if filters.is_empty() {
        return None;
    }
    let values: Vec<&str> = filters.iter().map(|f| f.value.as_str()).collect();
    Some(IndexKey::encode(&values).into_bytes())
}

/// Smallest key greater than every key starting with `prefix`.
///
/// Encoded tuples always end in the terminator `0x00 0x01`, so bumping the
/// final byte bounds the whole prefix range.
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    if let Some(last) = end.last_mut() {
        *last += 1;
    }
    end
}

fn column_value(table: &str, object: &Map<String, Value>, column: &str) -> Result<Vec<u8>> {
    match object.get(column) {
        None | Some(Value::Null) => Err(StoreError::MissingIndexColumn {
            table: table.to_string(),
            column: column.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.as_bytes().to_vec()),
        Some(other) => Ok(other.to_string().into_bytes()),
    }
}
