//! Error types for Consent Vault Core.

use thiserror::Error;

/// Errors raised while mapping records to and from storage assets.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The asset does not carry a consent record.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Errors raised while declaring index tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("index columns are invalid: {0}")]
    InvalidColumns(String),

    #[error("index {index} on table {table} conflicts with an existing definition: {reason}")]
    Conflict {
        table: String,
        index: String,
        reason: String,
    },

    #[error("table {table} already has primary key {existing}, requested {requested}")]
    PrimaryKeyMismatch {
        table: String,
        existing: String,
        requested: String,
    },
}

/// Errors raised while decoding a pagination cursor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid hex: {0}")]
    InvalidHex(String),

    #[error("cursor does not encode an index key")]
    Malformed,
}
