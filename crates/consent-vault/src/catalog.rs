//! Declaration of the `Consent` index table.
//!
//! Records are ordered by `(Name, EventName, Consent_ID)`; the trailing
//! primary key makes the order total. The table carries that one secondary
//! index and nothing else, so paging never walks a foreign order.

use consent_vault_core::{
    IndexError, IndexSpec, IndexTable, CONSENT_INDEX_TABLE, CONSENT_PRIMARY_KEY,
};
use consent_vault_store::IndexCatalogBackend;

use crate::error::{Result, VaultError};

/// Leading columns of the secondary index; the primary key follows them.
pub const CONSENT_INDEX_COLUMNS: [&str; 2] = ["Name", "EventName"];

/// The secondary index records are paged through.
pub fn consent_index() -> IndexSpec {
    let mut columns: Vec<String> = CONSENT_INDEX_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.push(CONSENT_PRIMARY_KEY.to_string());
    IndexSpec {
        columns,
        unique: false,
    }
}

/// The full definition `setup_index` converges on.
pub fn consent_table() -> Result<IndexTable> {
    let spec = consent_index();
    let mut table = IndexTable::new(CONSENT_INDEX_TABLE, CONSENT_PRIMARY_KEY);
    table
        .add_index(&spec.columns, spec.unique)
        .map_err(|e| VaultError::index_setup("building table Consent", e))?;
    Ok(table)
}

/// Declare the consent index on `backend`.
///
/// Idempotent. Returns `true` if the catalog changed. A persisted table that
/// already declares a different index is rejected and left untouched.
pub fn setup_index<B: IndexCatalogBackend + ?Sized>(backend: &B) -> Result<bool> {
    let span = tracing::info_span!("setup_index", table = CONSENT_INDEX_TABLE);
    let _enter = span.enter();

    let result = declare(backend);
    match &result {
        Ok(true) => tracing::info!("consent index declared"),
        Ok(false) => tracing::debug!("consent index already declared"),
        Err(e) => tracing::warn!(error = %e, "consent index setup failed"),
    }
    result
}

fn declare<B: IndexCatalogBackend + ?Sized>(backend: &B) -> Result<bool> {
    let spec = consent_index();
    let mut table = backend
        .table(CONSENT_INDEX_TABLE, CONSENT_PRIMARY_KEY)
        .map_err(|e| VaultError::index_setup("loading table Consent", e))?;

    if let Some(foreign) = table.indexes().iter().find(|i| i.columns != spec.columns) {
        return Err(VaultError::index_setup(
            "checking table Consent",
            IndexError::Conflict {
                table: CONSENT_INDEX_TABLE.to_string(),
                index: spec.name(),
                reason: format!("table already declares index {}", foreign.name()),
            },
        ));
    }

    table
        .add_index(&spec.columns, spec.unique)
        .map_err(|e| VaultError::index_setup("adding index Name,EventName", e))?;

    backend
        .save_table(&table)
        .map_err(|e| VaultError::index_setup("saving table Consent", e))
}
