//! Page scan throughput over memory and SQLite stores.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use consent_vault::store::SqliteStore;
use consent_vault::{ConsentContract, VaultConfig, GET_CONSENT_PAGE};
use consent_vault_keys::{Identity, KeyRing};
use consent_vault_testkit::fixtures::{shuffled_records, TestFixture};

const RECORDS: usize = 500;

fn drain<F>(mut page: F)
where
    F: FnMut(&str) -> String,
{
    let mut cursor = String::new();
    loop {
        cursor = page(&cursor);
        if cursor.is_empty() {
            break;
        }
    }
}

fn last_key(bytes: &[u8]) -> String {
    let value: serde_json::Value = serde_json::from_slice(bytes).unwrap();
    value["lastKey"].as_str().unwrap().to_string()
}

fn bench_memory(c: &mut Criterion) {
    let fixture = TestFixture::new();
    for r in shuffled_records(RECORDS, 1) {
        fixture.put(&r).unwrap();
    }

    let mut group = c.benchmark_group("memory_full_scan");
    for limit in [10usize, 100] {
        let limit_arg = limit.to_string();
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit_arg, |b, limit| {
            b.iter(|| {
                drain(|cursor| {
                    let bytes = fixture
                        .contract
                        .invoke(&fixture.caller, GET_CONSENT_PAGE, &[limit.as_str(), cursor])
                        .unwrap();
                    last_key(&bytes)
                })
            })
        });
    }
    group.finish();
}

fn bench_sqlite(c: &mut Criterion) {
    let ring = Arc::new(KeyRing::new());
    let caller = Identity::from_seed(&[1; 32]).caller();
    ring.register(&caller).unwrap();
    let store = SqliteStore::open_memory(ring.clone()).unwrap();
    let contract = ConsentContract::new(store, ring, VaultConfig::default());
    contract.init().unwrap();
    for r in shuffled_records(RECORDS, 1) {
        contract.records().put(&caller, &r).unwrap();
    }

    let mut group = c.benchmark_group("sqlite_full_scan");
    for limit in [10usize, 100] {
        let limit_arg = limit.to_string();
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit_arg, |b, limit| {
            b.iter(|| {
                drain(|cursor| {
                    let bytes = contract
                        .invoke(&caller, GET_CONSENT_PAGE, &[limit.as_str(), cursor])
                        .unwrap();
                    last_key(&bytes)
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_memory, bench_sqlite);
criterion_main!(benches);
