//! Golden test vectors for deterministic verification.
//!
//! Asset identifiers, key fingerprints, plaintext bytes and cursors are
//! persisted or handed to callers, so they must never drift between builds.

use consent_vault::ConsentRecord;

/// The canonical single-record example, byte for byte.
pub const E3_JSON: &str = concat!(
    r#"{"Consent_ID":"E3","Name":"Satya Majumder","Email":"satya@gmail.com","#,
    r#""phone":6127022297,"EventName":"JPMC Marathon","ConsentGiven":true}"#
);

/// The record encoded by [`E3_JSON`].
pub fn e3_record() -> ConsentRecord {
    ConsentRecord {
        consent_id: "E3".to_string(),
        name: "Satya Majumder".to_string(),
        email: "satya@gmail.com".to_string(),
        phone: 6127022297,
        event_name: "JPMC Marathon".to_string(),
        consent_given: true,
    }
}

/// Cursor returned after [`e3_record`] when another record follows it.
///
/// Hex of the index key `("Satya Majumder", "JPMC Marathon", "E3", digest)`.
pub const E3_CURSOR: &str = concat!(
    "5361747961204d616a756d64657200014a504d43204d61726174686f6e00014533000102",
    "9d8e23602c1c963ccdfc12f2499b4f2fe7b16d8263e8397c196709148ab9fb0001"
);

/// An asset identifier golden vector.
#[derive(Debug, Clone)]
pub struct AssetIdVector {
    /// Primary key within the `consent.Consent` namespace.
    pub consent_id: &'static str,
    /// Expected digest (hex).
    pub expected_digest: &'static str,
}

/// Asset identifier vectors.
pub fn asset_id_vectors() -> Vec<AssetIdVector> {
    vec![
        AssetIdVector {
            consent_id: "E3",
            expected_digest: "029d8e23602c1c963ccdfc12f2499b4f2fe7b16d8263e8397c196709148ab9fb",
        },
        AssetIdVector {
            consent_id: "E1",
            expected_digest: "a18057712fb16882520bfc0d4e75699df32431cb2b0e31d746364a7cc5327319",
        },
        AssetIdVector {
            consent_id: "A",
            expected_digest: "31a286f2493cc5176f32ee5c4e0a5fcebbb0840263afdae3633fc12c9e77e896",
        },
        AssetIdVector {
            consent_id: "B",
            expected_digest: "0f7b0bc6bd2247aacfc858a2691a6f5faab495c8e24869af500fa0d8deb6efda",
        },
    ]
}

/// A key fingerprint golden vector.
#[derive(Debug, Clone)]
pub struct KeyIdVector {
    pub key: [u8; 32],
    /// Expected key id (hex).
    pub expected_key_id: &'static str,
}

/// Key fingerprint vectors.
pub fn key_id_vectors() -> Vec<KeyIdVector> {
    vec![KeyIdVector {
        key: [0x42; 32],
        expected_key_id: "74837409e835258e3ea63ed9dd3bd307ef01d28800a7b8f454f2ede07bf1e6d1",
    }]
}
