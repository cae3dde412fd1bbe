//! # Consent Vault Testkit
//!
//! Testing utilities for Consent Vault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Asset ids, key ids, plaintext bytes and cursors that
//!   every build must reproduce exactly
//! - **Generators**: Proptest strategies for consent records
//! - **Fixtures**: A ready contract over a memory store with a registered caller
//!
//! ## Golden Vectors
//!
//! ```rust
//! use consent_vault::core::asset_id_for;
//! use consent_vault_testkit::vectors::asset_id_vectors;
//!
//! for vector in asset_id_vectors() {
//!     assert_eq!(asset_id_for(vector.consent_id).to_hex(), vector.expected_digest);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use consent_vault::core::{from_asset, to_asset};
//! use consent_vault_testkit::generators::consent_record;
//!
//! proptest! {
//!     #[test]
//!     fn codec_round_trips(record in consent_record()) {
//!         prop_assert_eq!(from_asset(&to_asset(&record).unwrap()).unwrap(), record);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use consent_vault_testkit::fixtures::{record, TestFixture};
//!
//! let fixture = TestFixture::new();
//! fixture.put(&record("E3", "Satya Majumder", "JPMC Marathon")).unwrap();
//! assert_eq!(fixture.collect_all(&fixture.caller, 10).unwrap().len(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixture, record, TestFixture};
