//! Error types for the keys module.

use thiserror::Error;

/// Errors that can occur while resolving keys or sealing payloads.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The caller has no registered key.
    #[error("unknown caller: {0}")]
    UnknownCaller(String),

    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption error.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Key registry lock was poisoned.
    #[error("key registry unavailable: {0}")]
    Unavailable(String),
}

/// Result type for key operations.
pub type Result<T> = std::result::Result<T, KeyError>;
