//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use consent_vault::{
    ConsentContract, ConsentRecord, PageLimit, PageRequest, RecordStore, Result, VaultConfig,
    WriteResult,
};
use consent_vault_core::Cursor;
use consent_vault_keys::{Caller, Identity, KeyRing};
use consent_vault_store::MemoryStore;

/// Contract type served by [`TestFixture`].
pub type MemoryContract = ConsentContract<Arc<MemoryStore>, Arc<KeyRing>>;

/// A memory-backed contract with the index declared and one registered caller.
pub struct TestFixture {
    pub identity: Identity,
    pub caller: Caller,
    pub ring: Arc<KeyRing>,
    pub store: Arc<MemoryStore>,
    pub contract: MemoryContract,
}

impl TestFixture {
    /// Fixture with a random identity and default configuration.
    pub fn new() -> Self {
        Self::build(Identity::generate(), VaultConfig::default())
    }

    /// Fixture with a deterministic identity.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::build(Identity::from_seed(&seed), VaultConfig::default())
    }

    /// Fixture with a random identity and `config`.
    pub fn with_config(config: VaultConfig) -> Self {
        Self::build(Identity::generate(), config)
    }

    fn build(identity: Identity, config: VaultConfig) -> Self {
        let ring = Arc::new(KeyRing::new());
        let store = Arc::new(MemoryStore::new(ring.clone()));
        let contract = ConsentContract::new(store.clone(), ring.clone(), config);
        contract
            .init()
            .expect("index setup on a fresh memory store");

        let caller = identity.caller();
        ring.register(&caller)
            .expect("registering a caller on a fresh key ring");

        Self {
            identity,
            caller,
            ring,
            store,
            contract,
        }
    }

    /// Register another caller on the same key ring.
    pub fn add_caller(&self, name: &str) -> Caller {
        let caller = Identity::generate().caller().named(name);
        self.ring
            .register(&caller)
            .expect("registering a fresh identity");
        caller
    }

    /// The typed record layer behind the contract.
    pub fn records(&self) -> &RecordStore<Arc<MemoryStore>, Arc<KeyRing>> {
        self.contract.records()
    }

    /// Store `record` as the fixture's caller.
    pub fn put(&self, record: &ConsentRecord) -> Result<WriteResult> {
        self.records().put(&self.caller, record)
    }

    /// Follow cursors from the first page to the last and concatenate.
    pub fn collect_all(&self, caller: &Caller, limit: usize) -> Result<Vec<ConsentRecord>> {
        let limit = PageLimit::new(limit, self.records().config())?;
        let mut cursor = Cursor::start();
        let mut all = Vec::new();

        loop {
            let page = self
                .records()
                .get_page(caller, &PageRequest::after(limit, cursor))?;
            all.extend(page.records);
            if page.next_cursor.is_empty() {
                return Ok(all);
            }
            cursor = page.next_cursor;
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixture plus `count` additional callers sharing its store.
pub fn multi_party_fixture(count: usize) -> (TestFixture, Vec<Caller>) {
    let fixture = TestFixture::new();
    let others = (0..count)
        .map(|i| fixture.add_caller(&format!("party-{}", i)))
        .collect();
    (fixture, others)
}

/// Build a record; email is derived from the id.
pub fn record(consent_id: &str, name: &str, event_name: &str) -> ConsentRecord {
    ConsentRecord {
        consent_id: consent_id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", consent_id.to_lowercase()),
        phone: 6127022297,
        event_name: event_name.to_string(),
        consent_given: true,
    }
}

/// `count` records over a small name/event vocabulary, in a seeded shuffled order.
///
/// Many records share `(Name, EventName)`, so ordering relies on the
/// primary key tie-break.
pub fn shuffled_records(count: usize, seed: u64) -> Vec<ConsentRecord> {
    const NAMES: [&str; 4] = ["Ann", "Bob", "Cyd", "Dee"];
    const EVENTS: [&str; 3] = ["10K", "Half", "Marathon"];

    let mut records: Vec<ConsentRecord> = (0..count)
        .map(|i| {
            record(
                &format!("C{:04}", i),
                NAMES[i % NAMES.len()],
                EVENTS[(i / NAMES.len()) % EVENTS.len()],
            )
        })
        .collect();
    records.shuffle(&mut StdRng::seed_from_u64(seed));
    records
}

/// `records` in `(Name, EventName, Consent_ID)` order.
pub fn index_order(mut records: Vec<ConsentRecord>) -> Vec<ConsentRecord> {
    records.sort_by(|a, b| {
        (&a.name, &a.event_name, &a.consent_id).cmp(&(&b.name, &b.event_name, &b.consent_id))
    });
    records
}
