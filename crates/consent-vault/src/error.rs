//! Error types for the vault.

use consent_vault_core::CodecError;
use consent_vault_keys::KeyError;
use consent_vault_store::StoreError;
use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Caller input rejected before any collaborator was touched.
    #[error("validation error: {0}")]
    Validation(String),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {context}: {source}")]
    Serialization {
        context: String,
        source: CodecError,
    },

    /// The index catalog rejected the consent table definition.
    #[error("index setup failed: {context}: {source}")]
    IndexSetup {
        context: String,
        source: StoreError,
    },

    /// The asset store failed.
    #[error("storage error: {context}: {source}")]
    Storage {
        context: String,
        source: StoreError,
    },

    /// The caller's key could not be resolved.
    #[error("identity error: {0}")]
    Identity(#[from] KeyError),
}

impl VaultError {
    pub(crate) fn serialization(context: impl Into<String>, source: impl Into<CodecError>) -> Self {
        Self::Serialization {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Wrap a store error; key failures surface as [`VaultError::Identity`].
    pub(crate) fn storage(context: impl Into<String>, source: StoreError) -> Self {
        match source {
            StoreError::Key(e) => Self::Identity(e),
            source => Self::Storage {
                context: context.into(),
                source,
            },
        }
    }

    pub(crate) fn index_setup(context: impl Into<String>, source: impl Into<StoreError>) -> Self {
        Self::IndexSetup {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
