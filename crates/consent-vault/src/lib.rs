//! # Consent Vault
//!
//! Encrypted, access-controlled consent records with stable, resumable
//! pagination.
//!
//! ## Overview
//!
//! A [`ConsentRecord`] is stored as an opaque per-owner encrypted asset keyed
//! by its `Consent_ID`. Records are read back in pages ordered by
//! `(Name, EventName, Consent_ID)`; each page carries a [`Cursor`] that is
//! empty once the last page has been served.
//!
//! - [`RecordStore`] - typed `put` / `get_page` over any [`store::AssetStore`]
//! - [`ConsentContract`] - the `PutConsent` / `GetConsentPage` / `SetupIndex`
//!   string-array entry points and their JSON wire format
//! - [`setup_index`] - idempotent declaration of the `Consent` index table
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use consent_vault::{ConsentContract, VaultConfig};
//! use consent_vault::keys::{Identity, KeyRing};
//! use consent_vault::store::SqliteStore;
//!
//! let ring = Arc::new(KeyRing::new());
//! let store = SqliteStore::open("vault.db", ring.clone()).unwrap();
//! let contract = ConsentContract::new(store, ring.clone(), VaultConfig::default());
//! contract.init().unwrap();
//!
//! let caller = Identity::generate().caller();
//! ring.register(&caller).unwrap();
//!
//! let record = r#"{"Consent_ID":"E3","Name":"Satya Majumder","Email":"satya@gmail.com",
//!     "phone":6127022297,"EventName":"JPMC Marathon","ConsentGiven":true}"#;
//! contract.invoke(&caller, "PutConsent", &[record]).unwrap();
//! let page = contract.invoke(&caller, "GetConsentPage", &["10", ""]).unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `consent_vault::core` - Records, assets, index definitions, cursors
//! - `consent_vault::keys` - Identities and encryption keys
//! - `consent_vault::store` - Asset store and index engine

pub mod catalog;
pub mod config;
pub mod contract;
pub mod error;
pub mod records;

// Re-export component crates
pub use consent_vault_core as core;
pub use consent_vault_keys as keys;
pub use consent_vault_store as store;

pub use catalog::{consent_index, consent_table, setup_index};
pub use config::VaultConfig;
pub use contract::{ConsentContract, GET_CONSENT_PAGE, PUT_CONSENT, SETUP_INDEX};
pub use error::{Result, VaultError};
pub use records::{ConsentPage, PageLimit, PageRequest, RecordStore};

pub use consent_vault_core::{ConsentRecord, Cursor};
pub use consent_vault_store::WriteResult;
