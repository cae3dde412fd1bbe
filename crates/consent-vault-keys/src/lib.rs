//! # Consent Vault Keys
//!
//! Caller identities, symmetric key resolution, and encrypted envelopes.
//!
//! ## Overview
//!
//! Every ledger invocation is made by a [`Caller`], identified by an Ed25519
//! public key. A [`KeyResolver`] maps the caller to the [`EncryptionKey`] its
//! records are sealed with. The asset store seals private data in an
//! [`EncryptedPayload`] and remembers the owning key by its [`KeyId`], so it
//! can tell which callers may read an asset without holding their keys.
//!
//! ## Encryption Model
//!
//! - **Symmetric key**: one ChaCha20-Poly1305 key per caller
//! - **Envelope**: fresh random nonce per seal, CBOR-encoded for storage
//! - **Key id**: Blake3-derived fingerprint of the key, stored in the clear
//!
//! ## Usage
//!
//! ```rust
//! use consent_vault_keys::{EncryptedPayload, Identity, KeyResolver, KeyRing};
//!
//! let ring = KeyRing::new();
//! let caller = Identity::generate().caller();
//! ring.register(&caller).unwrap();
//!
//! let key = ring.sym_key(&caller).unwrap();
//! let sealed = EncryptedPayload::seal(b"private", &key).unwrap();
//! assert_eq!(sealed.open(&key).unwrap(), b"private");
//! ```

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod keyring;

pub use crypto::{EncryptionKey, EncryptionNonce, KeyId};
pub use envelope::{EncryptedPayload, EncryptionFormat};
pub use error::{KeyError, Result};
pub use identity::{Caller, Identity, PublicKey};
pub use keyring::{KeyResolver, KeyRing};
