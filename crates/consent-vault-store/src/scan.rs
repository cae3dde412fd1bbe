//! Paged index scans shared by every backend.
//!
//! A backend turns an [`AssetPageQuery`] into a [`ScanPlan`], walks its
//! ordered entries inside the plan's bounds, and feeds them to
//! [`collect_page`] together with two callbacks: one that finds an asset and
//! checks its owner, and one that decrypts it. Only assets placed on the page
//! are decrypted.

use std::ops::Bound;

use consent_vault_core::{Cursor, IndexKey, IndexTable, StorageAsset};

use crate::error::{Result, StoreError};
use crate::index_key::{filter_prefix, prefix_end};
use crate::traits::{AssetPage, AssetPageQuery};

/// Resolved bounds and index for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    /// Name of the index to walk.
    pub index: String,
    /// Entries must start with this prefix.
    pub prefix: Option<Vec<u8>>,
    pub lower: Bound<Vec<u8>>,
    pub upper: Bound<Vec<u8>>,
    pub ascending: bool,
    pub limit: usize,
}

impl ScanPlan {
    /// Build the plan for `query` over `table`.
    pub fn new(table: &IndexTable, query: &AssetPageQuery) -> Result<Self> {
        if query.limit == 0 {
            return Err(StoreError::InvalidQuery("limit must be positive".to_string()));
        }

        let fields: Vec<String> = query.filters.iter().map(|f| f.field.clone()).collect();
        let spec = match &query.index {
            Some(name) => {
                let spec = table.index(name).ok_or_else(|| {
                    StoreError::InvalidQuery(format!(
                        "table {} has no index {}",
                        table.name(),
                        name
                    ))
                })?;
                if !spec.has_prefix(&fields) {
                    return Err(StoreError::InvalidQuery(format!(
                        "index {} does not start with {:?}",
                        name, fields
                    )));
                }
                spec
            }
            None => table.select_index(&fields).ok_or_else(|| {
                StoreError::InvalidQuery(format!(
                    "no index on table {} starts with {:?}",
                    table.name(),
                    fields
                ))
            })?,
        };

        let prefix = filter_prefix(&query.filters);
        let end = prefix.as_deref().map(prefix_end);
        let cursor = query.cursor.to_key()?.map(IndexKey::into_bytes);

        let (lower, upper) = if query.ascending {
            let lower = match cursor {
                Some(c) => Bound::Excluded(c),
                None => prefix.clone().map_or(Bound::Unbounded, Bound::Included),
            };
            (lower, end.map_or(Bound::Unbounded, Bound::Excluded))
        } else {
            let upper = match cursor {
                Some(c) => Bound::Excluded(c),
                None => end.map_or(Bound::Unbounded, Bound::Excluded),
            };
            (prefix.clone().map_or(Bound::Unbounded, Bound::Included), upper)
        };

        Ok(Self {
            index: spec.name(),
            prefix,
            lower,
            upper,
            ascending: query.ascending,
            limit: query.limit,
        })
    }

    /// True when no key can satisfy both bounds.
    pub fn is_empty_range(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) => l > u,
            (Bound::Included(l), Bound::Excluded(u))
            | (Bound::Excluded(l), Bound::Included(u))
            | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
            _ => false,
        }
    }
}

/// Walk ordered `(key, asset)` entries and assemble one page.
///
/// `locate` returns `None` for assets the caller may not see; those are
/// skipped. `open` decrypts a located asset and runs only for assets placed on
/// the page. The next cursor is set only if another visible entry exists past
/// the page.
pub fn collect_page<K, V, I, L, O>(
    plan: &ScanPlan,
    entries: I,
    mut locate: L,
    mut open: O,
) -> Result<AssetPage>
where
    I: IntoIterator<Item = Result<(Vec<u8>, K)>>,
    L: FnMut(&K) -> Result<Option<V>>,
    O: FnMut(&K, V) -> Result<StorageAsset>,
{
    let mut assets = Vec::new();
    let mut last_key: Option<Vec<u8>> = None;
    let mut has_more = false;

    for entry in entries {
        let (key, id) = entry?;
        if let Some(prefix) = &plan.prefix {
            if !key.starts_with(prefix) {
                continue;
            }
        }
        let Some(found) = locate(&id)? else {
            continue;
        };
        if assets.len() == plan.limit {
            has_more = true;
            break;
        }
        assets.push(open(&id, found)?);
        last_key = Some(key);
    }

    let next_cursor = match (has_more, last_key) {
        (true, Some(key)) => {
            let key = IndexKey::from_bytes(key)
                .map_err(|e| StoreError::InvalidData(format!("stored index key: {}", e)))?;
            Cursor::after(&key)
        }
        _ => Cursor::start(),
    };

    Ok(AssetPage {
        assets,
        next_cursor,
    })
}
