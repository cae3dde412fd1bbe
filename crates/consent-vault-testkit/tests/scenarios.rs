//! End-to-end scenarios through the string-array contract and the record layer.

use std::sync::Arc;

use anyhow::Result;
use proptest::prelude::*;
use serde_json::Value;

use consent_vault::core::{IndexError, IndexTable};
use consent_vault::store::{IndexCatalogBackend, MemoryStore, SqliteStore, StoreError};
use consent_vault::{
    ConsentContract, ConsentRecord, VaultConfig, VaultError, WriteResult, GET_CONSENT_PAGE,
    PUT_CONSENT, SETUP_INDEX,
};
use consent_vault_keys::{Identity, KeyRing};
use consent_vault_testkit::fixtures::{index_order, record, shuffled_records, TestFixture};
use consent_vault_testkit::generators::distinct_records;
use consent_vault_testkit::vectors::{e3_record, E3_CURSOR, E3_JSON};

fn with_logging<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

fn page_json(fixture: &TestFixture, limit: &str, cursor: &str) -> Result<Value> {
    let bytes = fixture
        .contract
        .invoke(&fixture.caller, GET_CONSENT_PAGE, &[limit, cursor])?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[test]
fn e3_single_record() -> Result<()> {
    with_logging(|| -> Result<()> {
        let fixture = TestFixture::new();
        let out = fixture
            .contract
            .invoke(&fixture.caller, PUT_CONSENT, &[E3_JSON])?;
        assert!(out.is_empty());

        let bytes = fixture
            .contract
            .invoke(&fixture.caller, GET_CONSENT_PAGE, &["10", ""])?;
        assert_eq!(
            String::from_utf8(bytes)?,
            format!(r#"{{"consentPage":[{}],"lastKey":""}}"#, E3_JSON)
        );
        Ok(())
    })
}

#[test]
fn tie_break_on_consent_id() -> Result<()> {
    let fixture = TestFixture::new();
    fixture.put(&record("B", "Satya", "Run"))?;
    fixture.put(&record("A", "Satya", "Run"))?;

    let first = page_json(&fixture, "1", "")?;
    assert_eq!(first["consentPage"][0]["Consent_ID"], "A");
    let cursor = first["lastKey"].as_str().unwrap_or_default().to_string();
    assert!(!cursor.is_empty());

    let second = page_json(&fixture, "1", &cursor)?;
    assert_eq!(second["consentPage"][0]["Consent_ID"], "B");
    assert_eq!(second["lastKey"], "");
    Ok(())
}

#[test]
fn cursor_matches_golden_vector() -> Result<()> {
    let fixture = TestFixture::new();
    fixture.put(&e3_record())?;
    let mut e4 = e3_record();
    e4.consent_id = "E4".to_string();
    fixture.put(&e4)?;

    let first = page_json(&fixture, "1", "")?;
    assert_eq!(first["lastKey"], E3_CURSOR);

    let second = page_json(&fixture, "1", E3_CURSOR)?;
    assert_eq!(second["consentPage"][0]["Consent_ID"], "E4");
    assert_eq!(second["lastKey"], "");
    Ok(())
}

#[test]
fn pagination_complete_for_every_limit() -> Result<()> {
    let fixture = TestFixture::new();
    let records = shuffled_records(37, 42);
    for r in &records {
        fixture.put(r)?;
    }
    let expected = index_order(records);

    for limit in [1, 2, 3, 5, 10, 36, 37, 38, 1000] {
        let all = fixture.collect_all(&fixture.caller, limit)?;
        assert_eq!(all, expected, "limit {}", limit);
    }
    Ok(())
}

#[test]
fn exact_multiple_ends_without_empty_page() -> Result<()> {
    let fixture = TestFixture::new();
    for r in shuffled_records(4, 3) {
        fixture.put(&r)?;
    }

    let first = page_json(&fixture, "2", "")?;
    let cursor = first["lastKey"].as_str().unwrap_or_default().to_string();
    let second = page_json(&fixture, "2", &cursor)?;
    assert_eq!(second["consentPage"].as_array().map(Vec::len), Some(2));
    assert_eq!(second["lastKey"], "");
    Ok(())
}

#[test]
fn wrong_argument_counts_write_nothing() {
    let fixture = TestFixture::new();
    let none: [&str; 0] = [];

    for (function, args) in [
        (PUT_CONSENT, &none[..]),
        (PUT_CONSENT, &[E3_JSON, E3_JSON][..]),
        (GET_CONSENT_PAGE, &["10"][..]),
        (GET_CONSENT_PAGE, &["10", "", ""][..]),
    ] {
        let result = fixture.contract.invoke(&fixture.caller, function, args);
        assert!(
            matches!(result, Err(VaultError::Validation(_))),
            "{} with {} args",
            function,
            args.len()
        );
    }
    assert!(fixture.store.is_empty());
}

#[test]
fn setup_index_is_idempotent() -> Result<()> {
    let fixture = TestFixture::new();
    let none: [&str; 0] = [];
    fixture.put(&e3_record())?;

    fixture.contract.invoke(&fixture.caller, SETUP_INDEX, &none)?;
    fixture.contract.init()?;

    let all = fixture.collect_all(&fixture.caller, 10)?;
    assert_eq!(all, vec![e3_record()]);
    Ok(())
}

#[test]
fn init_rejects_table_with_other_indexes() -> Result<()> {
    for columns in [
        vec!["EventName"],
        vec!["EventName", "Name", "Consent_ID"],
        vec!["Name", "EventName"],
    ] {
        let ring = Arc::new(KeyRing::new());
        let store = Arc::new(MemoryStore::new(ring.clone()));
        let mut foreign = IndexTable::new("Consent", "Consent_ID");
        foreign.add_index(columns.as_slice(), false)?;
        store.save_table(&foreign)?;

        let contract = ConsentContract::new(store.clone(), ring.clone(), VaultConfig::default());
        let err = contract.init().unwrap_err();
        assert!(
            matches!(
                err,
                VaultError::IndexSetup {
                    source: StoreError::Index(IndexError::Conflict { .. }),
                    ..
                }
            ),
            "{:?} accepted",
            columns
        );
        assert_eq!(store.table("Consent", "Consent_ID")?, foreign);
    }
    Ok(())
}

#[test]
fn sqlite_init_rejects_table_with_other_indexes() -> Result<()> {
    let ring = Arc::new(KeyRing::new());
    let store = SqliteStore::open_memory(ring.clone())?;
    let mut foreign = IndexTable::new("Consent", "Consent_ID");
    foreign.add_index(&["EventName"], false)?;
    store.save_table(&foreign)?;

    let contract = ConsentContract::new(store, ring, VaultConfig::default());
    assert!(matches!(
        contract.init(),
        Err(VaultError::IndexSetup { .. })
    ));
    Ok(())
}

#[test]
fn oversized_limit_serves_capped_page() -> Result<()> {
    let fixture = TestFixture::with_config(VaultConfig::default().with_max_page_limit(3));
    for r in shuffled_records(5, 11) {
        fixture.put(&r)?;
    }

    let page = page_json(&fixture, "5000", "")?;
    assert_eq!(page["consentPage"].as_array().map(Vec::len), Some(3));
    assert_ne!(page["lastKey"], "");
    Ok(())
}

#[test]
fn callers_only_see_their_own_records() -> Result<()> {
    let fixture = TestFixture::new();
    let bob = fixture.add_caller("bob");

    let mut mine = Vec::new();
    for (i, r) in shuffled_records(12, 9).into_iter().enumerate() {
        if i % 3 == 0 {
            fixture.records().put(&bob, &r)?;
        } else {
            fixture.put(&r)?;
            mine.push(r);
        }
    }

    assert_eq!(fixture.collect_all(&fixture.caller, 2)?, index_order(mine));
    assert_eq!(fixture.collect_all(&bob, 3)?.len(), 4);

    let stranger = fixture.add_caller("stranger");
    let page = fixture
        .contract
        .invoke(&stranger, GET_CONSENT_PAGE, &["5", ""])?;
    assert_eq!(
        serde_json::from_slice::<Value>(&page)?,
        serde_json::json!({"consentPage": [], "lastKey": ""})
    );
    Ok(())
}

#[test]
fn foreign_record_cannot_be_overwritten() -> Result<()> {
    let fixture = TestFixture::new();
    let bob = fixture.add_caller("bob");
    fixture.put(&e3_record())?;

    let result = fixture.records().put(&bob, &record("E3", "Mallory", "Run"));
    assert!(matches!(
        result,
        Err(VaultError::Storage {
            source: StoreError::AccessDenied(_),
            ..
        })
    ));
    assert_eq!(fixture.collect_all(&fixture.caller, 10)?, vec![e3_record()]);
    Ok(())
}

#[test]
fn overwrite_keeps_one_record() -> Result<()> {
    let fixture = TestFixture::new();
    assert_eq!(fixture.put(&e3_record())?, WriteResult::Inserted);

    let mut updated = e3_record();
    updated.consent_given = false;
    assert_eq!(fixture.put(&updated)?, WriteResult::Replaced);

    assert_eq!(fixture.collect_all(&fixture.caller, 10)?, vec![updated]);
    assert_eq!(fixture.store.len(), 1);
    Ok(())
}

#[test]
fn malformed_cursors_rejected() {
    let fixture = TestFixture::new();
    fixture.put(&e3_record()).unwrap();

    for cursor in ["zz", "0", "00", "4100"] {
        let result = fixture
            .contract
            .invoke(&fixture.caller, GET_CONSENT_PAGE, &["5", cursor]);
        assert!(
            matches!(
                result,
                Err(VaultError::Storage {
                    source: StoreError::InvalidCursor(_),
                    ..
                })
            ),
            "cursor {:?} accepted",
            cursor
        );
    }
}

#[test]
fn sqlite_persists_across_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("consent.db");
    let ring = Arc::new(KeyRing::new());
    let caller = Identity::from_seed(&[3; 32]).caller();
    ring.register(&caller)?;

    let records = shuffled_records(9, 5);
    {
        let store = SqliteStore::open(&path, ring.clone())?;
        let contract = ConsentContract::new(store, ring.clone(), VaultConfig::default());
        contract.init()?;
        for r in &records {
            contract.records().put(&caller, r)?;
        }
    }

    let store = SqliteStore::open(&path, ring.clone())?;
    let contract = ConsentContract::new(store, ring, VaultConfig::default());
    contract.init()?;

    let mut cursor = String::new();
    let mut seen: Vec<ConsentRecord> = Vec::new();
    loop {
        let bytes = contract.invoke(&caller, GET_CONSENT_PAGE, &["4", cursor.as_str()])?;
        let page: Value = serde_json::from_slice(&bytes)?;
        for item in page["consentPage"].as_array().cloned().unwrap_or_default() {
            seen.push(serde_json::from_value(item)?);
        }
        cursor = page["lastKey"].as_str().unwrap_or_default().to_string();
        if cursor.is_empty() {
            break;
        }
    }
    assert_eq!(seen, index_order(records));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn paging_visits_every_record_once(records in distinct_records(20), limit in 1usize..8) {
        let fixture = TestFixture::new();
        for r in &records {
            fixture.put(r).unwrap();
        }
        let all = fixture.collect_all(&fixture.caller, limit).unwrap();
        prop_assert_eq!(all, index_order(records));
    }
}
