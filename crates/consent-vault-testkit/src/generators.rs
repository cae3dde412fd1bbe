//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use consent_vault::ConsentRecord;
use consent_vault_keys::Identity;

/// Generate a non-empty primary key.
pub fn consent_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,16}"
}

/// Generate an indexed text field, occasionally with awkward characters.
pub fn indexed_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[A-Za-z ]{0,12}",
        1 => ".{0,6}",
        1 => Just("a\u{0}b".to_string()),
    ]
}

/// Generate a random identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(|seed| Identity::from_seed(&seed))
}

/// Generate everything in a record except its primary key.
fn record_body() -> impl Strategy<Value = (String, String, i64, String, bool)> {
    (
        indexed_text(),
        "[a-z]{1,8}@[a-z]{1,8}\\.com",
        any::<i64>(),
        indexed_text(),
        any::<bool>(),
    )
}

/// Generate a consent record.
pub fn consent_record() -> impl Strategy<Value = ConsentRecord> {
    (consent_id(), record_body()).prop_map(|(id, body)| with_body(id, body))
}

/// Generate up to `max` records with distinct primary keys.
pub fn distinct_records(max: usize) -> impl Strategy<Value = Vec<ConsentRecord>> {
    prop::collection::btree_map(consent_id(), record_body(), 0..=max).prop_map(
        |bodies: BTreeMap<String, _>| {
            bodies
                .into_iter()
                .map(|(id, body)| with_body(id, body))
                .collect()
        },
    )
}

fn with_body(
    consent_id: String,
    (name, email, phone, event_name, consent_given): (String, String, i64, String, bool),
) -> ConsentRecord {
    ConsentRecord {
        consent_id,
        name,
        email,
        phone,
        event_name,
        consent_given,
    }
}
