//! Caller → symmetric key resolution.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::crypto::EncryptionKey;
use crate::error::{KeyError, Result};
use crate::identity::{Caller, PublicKey};

/// Resolves the symmetric key a caller encrypts and decrypts with.
pub trait KeyResolver: Send + Sync {
    /// The caller's symmetric key.
    fn sym_key(&self, caller: &Caller) -> Result<EncryptionKey>;
}

impl<T: KeyResolver + ?Sized> KeyResolver for Arc<T> {
    fn sym_key(&self, caller: &Caller) -> Result<EncryptionKey> {
        (**self).sym_key(caller)
    }
}

impl<T: KeyResolver + ?Sized> KeyResolver for &T {
    fn sym_key(&self, caller: &Caller) -> Result<EncryptionKey> {
        (**self).sym_key(caller)
    }
}

/// In-memory registry of caller keys.
#[derive(Default)]
pub struct KeyRing {
    keys: RwLock<HashMap<PublicKey, EncryptionKey>>,
}

impl KeyRing {
    /// Create an empty key ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a caller, generating a fresh key.
    ///
    /// Registering an already-known caller returns its existing key.
    pub fn register(&self, caller: &Caller) -> Result<EncryptionKey> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| KeyError::Unavailable(e.to_string()))?;
        Ok(keys
            .entry(caller.public_key)
            .or_insert_with(EncryptionKey::generate)
            .clone())
    }

    /// Register a caller with a known key, replacing any previous one.
    pub fn register_with_key(&self, caller: &Caller, key: EncryptionKey) -> Result<()> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| KeyError::Unavailable(e.to_string()))?;
        keys.insert(caller.public_key, key);
        Ok(())
    }

    /// Is this caller registered?
    ///
    /// Reads through a poisoned lock; `sym_key` reports it instead.
    pub fn contains(&self, caller: &Caller) -> bool {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&caller.public_key)
    }

    /// Number of registered callers, read through a poisoned lock.
    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when no caller is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyResolver for KeyRing {
    fn sym_key(&self, caller: &Caller) -> Result<EncryptionKey> {
        let keys = self
            .keys
            .read()
            .map_err(|e| KeyError::Unavailable(e.to_string()))?;
        keys.get(&caller.public_key)
            .cloned()
            .ok_or_else(|| KeyError::UnknownCaller(caller.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    #[test]
    fn test_register_and_resolve() {
        let ring = KeyRing::new();
        let caller = Identity::generate().caller();

        let key = ring.register(&caller).unwrap();
        assert_eq!(ring.sym_key(&caller).unwrap(), key);
        assert!(ring.contains(&caller));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_register_idempotent() {
        let ring = KeyRing::new();
        let caller = Identity::generate().caller();

        let k1 = ring.register(&caller).unwrap();
        let k2 = ring.register(&caller).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_unknown_caller() {
        let ring = KeyRing::new();
        let caller = Identity::generate().caller();
        assert!(ring.is_empty());
        assert!(matches!(
            ring.sym_key(&caller),
            Err(KeyError::UnknownCaller(_))
        ));
    }

    #[test]
    fn test_register_with_key_replaces() {
        let ring = KeyRing::new();
        let caller = Identity::generate().caller();
        ring.register(&caller).unwrap();

        let fixed = EncryptionKey::from_bytes([7; 32]);
        ring.register_with_key(&caller, fixed.clone()).unwrap();
        assert_eq!(ring.sym_key(&caller).unwrap(), fixed);
    }

    #[test]
    fn test_resolver_through_arc() {
        let ring = Arc::new(KeyRing::new());
        let caller = Identity::generate().caller();
        let key = ring.register(&caller).unwrap();

        let resolver: Arc<dyn KeyResolver> = ring;
        assert_eq!(resolver.sym_key(&caller).unwrap(), key);
    }

    #[test]
    fn test_poisoned_ring_still_counts() {
        let ring = KeyRing::new();
        let caller = Identity::generate().caller();
        ring.register(&caller).unwrap();

        std::thread::scope(|scope| {
            let crashed = scope
                .spawn(|| {
                    let _guard = ring.keys.write().unwrap();
                    panic!("registration crashed");
                })
                .join();
            assert!(crashed.is_err());
        });

        assert!(ring.keys.is_poisoned());
        assert!(ring.contains(&caller));
        assert_eq!(ring.len(), 1);
        assert!(matches!(
            ring.sym_key(&caller),
            Err(KeyError::Unavailable(_))
        ));
    }
}
