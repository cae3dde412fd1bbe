//! Order-preserving index keys and opaque pagination cursors.
//!
//! An [`IndexKey`] is a tuple of byte-string components encoded so that
//! comparing encoded bytes equals comparing the tuples component-wise. Each
//! component has `0x00` escaped as `0x00 0xFF` and is terminated by
//! `0x00 0x01`. Prefix tuples encode to byte prefixes.
//!
//! A [`Cursor`] is the hex form of the last key returned by a scan. The empty
//! cursor means "from the start" on input and "no more pages" on output.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CursorError;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

/// Encoded tuple key of an index entry.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndexKey(Vec<u8>);

impl IndexKey {
    /// Create an empty key (the empty tuple).
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a tuple of components.
    pub fn encode<S: AsRef<[u8]>>(components: &[S]) -> Self {
        let mut key = Self::new();
        for component in components {
            key.push(component.as_ref());
        }
        key
    }

    /// Append one component.
    pub fn push(&mut self, component: &[u8]) {
        for &b in component {
            if b == ESCAPE {
                self.0.extend_from_slice(&[ESCAPE, ESCAPED_ZERO]);
            } else {
                self.0.push(b);
            }
        }
        self.0.extend_from_slice(&[ESCAPE, TERMINATOR]);
    }

    /// Parse raw bytes, checking that they are a well-formed encoding.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CursorError> {
        let key = Self(bytes);
        key.components()?;
        Ok(key)
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Does this key begin with the tuple encoded by `prefix`?
    pub fn starts_with(&self, prefix: &IndexKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Decode back into components.
    pub fn components(&self) -> Result<Vec<Vec<u8>>, CursorError> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        let mut bytes = self.0.iter();

        while let Some(&b) = bytes.next() {
            if b != ESCAPE {
                current.push(b);
                continue;
            }
            match bytes.next() {
                Some(&ESCAPED_ZERO) => current.push(ESCAPE),
                Some(&TERMINATOR) => out.push(std::mem::take(&mut current)),
                _ => return Err(CursorError::Malformed),
            }
        }

        if !current.is_empty() {
            return Err(CursorError::Malformed);
        }
        Ok(out)
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexKey({})", hex::encode(&self.0))
    }
}

/// Opaque pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Cursor requesting the first page.
    pub fn start() -> Self {
        Self::default()
    }

    /// Cursor resuming after `key`.
    pub fn after(key: &IndexKey) -> Self {
        Self(hex::encode(key.as_bytes()))
    }

    /// True for the start cursor and for the terminal "no more pages" cursor.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The cursor token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the resume key. `None` for the empty cursor.
    pub fn to_key(&self) -> Result<Option<IndexKey>, CursorError> {
        if self.0.is_empty() {
            return Ok(None);
        }
        let bytes = hex::decode(&self.0).map_err(|e| CursorError::InvalidHex(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CursorError::Malformed);
        }
        IndexKey::from_bytes(bytes).map(Some)
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tuple_order_not_concatenation_order() {
        // ("ab", "c") vs ("a", "bz"): concatenation would put "abc" < "abz",
        // tuple order compares "ab" > "a".
        let a = IndexKey::encode(&["ab", "c"]);
        let b = IndexKey::encode(&["a", "bz"]);
        assert!(b < a);
    }

    #[test]
    fn test_tie_break_on_last_component() {
        let a = IndexKey::encode(&["Same", "Event", "A"]);
        let b = IndexKey::encode(&["Same", "Event", "B"]);
        assert!(a < b);
    }

    #[test]
    fn test_prefix() {
        let key = IndexKey::encode(&["Name", "Event", "ID"]);
        assert!(key.starts_with(&IndexKey::encode(&["Name"])));
        assert!(key.starts_with(&IndexKey::encode(&["Name", "Event"])));
        assert!(!key.starts_with(&IndexKey::encode(&["Nam"])));
    }

    #[test]
    fn test_zero_bytes_escaped() {
        let key = IndexKey::encode(&[&b"a\x00b"[..], &b""[..]]);
        let parts = key.components().unwrap();
        assert_eq!(parts, vec![b"a\x00b".to_vec(), Vec::new()]);
    }

    #[test]
    fn test_cursor_roundtrip() {
        let key = IndexKey::encode(&["Satya", "JPMC Marathon", "E3"]);
        let cursor = Cursor::after(&key);
        assert!(!cursor.is_empty());
        assert_eq!(cursor.to_key().unwrap(), Some(key));
    }

    #[test]
    fn test_empty_cursor() {
        assert!(Cursor::start().is_empty());
        assert_eq!(Cursor::start().to_key().unwrap(), None);
    }

    #[test]
    fn test_malformed_cursors() {
        assert!(matches!(
            Cursor::from("zz").to_key(),
            Err(CursorError::InvalidHex(_))
        ));
        // "61" = "a" with no terminator
        assert_eq!(Cursor::from("61").to_key(), Err(CursorError::Malformed));
        // escape followed by an unknown marker
        assert_eq!(Cursor::from("0002").to_key(), Err(CursorError::Malformed));
    }

    proptest! {
        #[test]
        fn prop_byte_order_matches_tuple_order(
            a in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..6), 1..4),
            b in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..6), 1..4),
        ) {
            let ka = IndexKey::encode(&a);
            let kb = IndexKey::encode(&b);
            prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
        }
    }
}
