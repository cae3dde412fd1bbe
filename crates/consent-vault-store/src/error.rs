//! Error types for the store module.

use consent_vault_core::{CursorError, IndexError};
use consent_vault_keys::KeyError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Index definition rejected.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Asset refers to an index table nobody declared.
    #[error("unknown index table: {0}")]
    UnknownIndexTable(String),

    /// Asset data lacks a value for an indexed column.
    #[error("asset has no value for column {column} of index table {table}")]
    MissingIndexColumn { table: String, column: String },

    /// Two assets share the columns of a unique index.
    #[error("unique index {index} on table {table} already holds this value")]
    UniqueViolation { table: String, index: String },

    /// The index set of a table that already holds entries cannot change.
    #[error("index table {0} already holds entries; its indexes cannot change")]
    PopulatedTable(String),

    /// Page query cannot be served.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Cursor could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    /// Insert-only write hit an existing asset.
    #[error("asset already exists: {0}")]
    AlreadyExists(String),

    /// Caller may not read or replace this asset.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Key resolution or encryption failed.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Asset data serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding store state was poisoned.
    #[error("store unavailable: {0}")]
    Poisoned(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
