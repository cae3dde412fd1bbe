//! Typed record operations over the asset store.
//!
//! [`RecordStore`] owns namespace, index table and key selection. Callers
//! hand it typed records and page requests; it drives the codec and the
//! store and hands back typed records with an opaque cursor.

use tracing::Span;

use consent_vault_core::{
    asset_id_for, from_asset, to_asset, ConsentRecord, Cursor, CONSENT_INDEX_TABLE,
    CONSENT_NAMESPACE,
};
use consent_vault_keys::{Caller, KeyResolver};
use consent_vault_store::{AssetPageQuery, AssetStore, WritePolicy, WriteResult};

use crate::catalog::consent_index;
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};

/// A validated page size: positive and within the configured cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageLimit(usize);

impl PageLimit {
    /// Validate `limit` against `config`.
    ///
    /// Zero is rejected. A limit above `config.max_page_limit` is clamped to it.
    pub fn new(limit: usize, config: &VaultConfig) -> Result<Self> {
        if limit == 0 {
            return Err(VaultError::Validation(
                "page limit must be positive".to_string(),
            ));
        }
        let cap = config.max_page_limit.max(1);
        if limit > cap {
            tracing::debug!(requested = limit, cap, "page limit clamped");
        }
        Ok(Self(limit.min(cap)))
    }

    /// Parse a decimal limit as received on the wire.
    pub fn parse(text: &str, config: &VaultConfig) -> Result<Self> {
        let value: i128 = text.parse().map_err(|_| {
            VaultError::Validation(format!("page limit {:?} is not an integer", text))
        })?;
        if value <= 0 {
            return Err(VaultError::Validation(format!(
                "page limit must be positive, got {}",
                value
            )));
        }
        Self::new(usize::try_from(value).unwrap_or(usize::MAX), config)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// One page request: how many records, starting where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: PageLimit,
    /// Empty for the first page.
    pub cursor: Cursor,
}

impl PageRequest {
    /// Request the first page.
    pub fn first(limit: PageLimit) -> Self {
        Self {
            limit,
            cursor: Cursor::start(),
        }
    }

    /// Request the page after `cursor`.
    pub fn after(limit: PageLimit, cursor: Cursor) -> Self {
        Self { limit, cursor }
    }
}

/// A page of records in `(Name, EventName, Consent_ID)` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentPage {
    pub records: Vec<ConsentRecord>,
    /// Resume point; empty when this is the last page.
    pub next_cursor: Cursor,
}

impl ConsentPage {
    /// True when no further page exists.
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_empty()
    }
}

/// Consent records on top of an [`AssetStore`].
pub struct RecordStore<S, K> {
    store: S,
    keys: K,
    config: VaultConfig,
    span: Span,
}

impl<S: AssetStore, K: KeyResolver> RecordStore<S, K> {
    /// Create a record store. Per-call spans are children of the current span.
    pub fn new(store: S, keys: K, config: VaultConfig) -> Self {
        Self {
            store,
            keys,
            config,
            span: Span::current(),
        }
    }

    /// Parent every per-call span under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The underlying asset store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create or overwrite the record keyed by `record.consent_id`.
    pub fn put(&self, caller: &Caller, record: &ConsentRecord) -> Result<WriteResult> {
        let span = tracing::debug_span!(
            parent: &self.span,
            "put_consent",
            consent_id = %record.consent_id,
            caller = %caller
        );
        let _enter = span.enter();

        let result = self.put_inner(caller, record);
        match &result {
            Ok(outcome) => tracing::debug!(?outcome, "consent record stored"),
            Err(e) => tracing::warn!(error = %e, "consent record rejected"),
        }
        result
    }

    fn put_inner(&self, caller: &Caller, record: &ConsentRecord) -> Result<WriteResult> {
        if record.consent_id.is_empty() {
            return Err(VaultError::Validation(
                "Consent_ID must not be empty".to_string(),
            ));
        }

        let key = self.keys.sym_key(caller)?;
        let asset = to_asset(record)
            .map_err(|e| VaultError::serialization(format!("encoding {}", record.consent_id), e))?;

        self.store
            .add_asset(caller, &asset, &key, WritePolicy::Upsert)
            .map_err(|e| VaultError::storage(format!("writing {}", record.consent_id), e))
    }

    /// Read one record by primary key, if the caller can see it.
    pub fn get(&self, caller: &Caller, consent_id: &str) -> Result<Option<ConsentRecord>> {
        let asset_id = asset_id_for(consent_id);
        let asset = self
            .store
            .get_asset(caller, &asset_id)
            .map_err(|e| VaultError::storage(format!("reading {}", consent_id), e))?;

        asset
            .map(|a| {
                from_asset(&a)
                    .map_err(|e| VaultError::serialization(format!("decoding {}", consent_id), e))
            })
            .transpose()
    }

    /// Read one page of the caller's records.
    pub fn get_page(&self, caller: &Caller, request: &PageRequest) -> Result<ConsentPage> {
        let span = tracing::debug_span!(
            parent: &self.span,
            "get_consent_page",
            limit = request.limit.get(),
            caller = %caller
        );
        let _enter = span.enter();

        let result = self.get_page_inner(caller, request);
        match &result {
            Ok(page) => tracing::debug!(
                count = page.records.len(),
                has_more = !page.is_last(),
                "consent page served"
            ),
            Err(e) => tracing::warn!(error = %e, "consent page failed"),
        }
        result
    }

    fn get_page_inner(&self, caller: &Caller, request: &PageRequest) -> Result<ConsentPage> {
        // A PageLimit built under another config may exceed our cap.
        let limit = PageLimit::new(request.limit.get(), &self.config)?;

        let query = AssetPageQuery::new(CONSENT_NAMESPACE, CONSENT_INDEX_TABLE, limit.get())
            .using_index(consent_index().name())
            .after(request.cursor.clone());
        let page = self
            .store
            .get_asset_page(caller, &query)
            .map_err(|e| VaultError::storage("reading consent page", e))?;

        let records = page
            .assets
            .iter()
            .map(|asset| {
                from_asset(asset).map_err(|e| {
                    VaultError::serialization(format!("decoding asset {}", asset.asset_id), e)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ConsentPage {
            records,
            next_cursor: page.next_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use consent_vault_core::IndexTable;
    use consent_vault_keys::{Identity, KeyError, KeyRing};
    use consent_vault_store::{IndexCatalogBackend, MemoryStore, StoreError};

    use crate::catalog::setup_index;

    struct Harness {
        records: RecordStore<Arc<MemoryStore>, Arc<KeyRing>>,
        ring: Arc<KeyRing>,
    }

    fn harness() -> Harness {
        let ring = Arc::new(KeyRing::new());
        let store = Arc::new(MemoryStore::new(ring.clone()));
        setup_index(store.as_ref()).unwrap();
        Harness {
            records: RecordStore::new(store, ring.clone(), VaultConfig::default()),
            ring,
        }
    }

    fn record(id: &str, name: &str, event: &str) -> ConsentRecord {
        ConsentRecord {
            consent_id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id.to_lowercase()),
            phone: 5550100,
            event_name: event.to_string(),
            consent_given: true,
        }
    }

    fn limit(n: usize) -> PageLimit {
        PageLimit::new(n, &VaultConfig::default()).unwrap()
    }

    #[test]
    fn test_page_limit_parse() {
        let config = VaultConfig::default();
        assert_eq!(PageLimit::parse("10", &config).unwrap().get(), 10);
        assert_eq!(PageLimit::parse("1000", &config).unwrap().get(), 1000);
        assert_eq!(PageLimit::parse("1001", &config).unwrap().get(), 1000);
        assert_eq!(PageLimit::parse("5000", &config).unwrap().get(), 1000);
        assert_eq!(
            PageLimit::parse("99999999999999999999", &config).unwrap().get(),
            1000
        );

        for bad in ["", "ten", "1.5", "0", "-3", " 5", "+-1"] {
            assert!(
                matches!(PageLimit::parse(bad, &config), Err(VaultError::Validation(_))),
                "{:?} accepted",
                bad
            );
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_page_limit_parse_bounds(n in -5i64..2000) {
            let config = VaultConfig::default();
            let parsed = PageLimit::parse(&n.to_string(), &config);
            if n >= 1 {
                proptest::prop_assert_eq!(parsed.unwrap().get() as i64, n.min(1000));
            } else {
                proptest::prop_assert!(matches!(parsed, Err(VaultError::Validation(_))));
            }
        }
    }

    #[test]
    fn test_put_then_get() {
        let h = harness();
        let caller = Identity::generate().caller();
        h.ring.register(&caller).unwrap();

        let r = record("E3", "Satya Majumder", "JPMC Marathon");
        assert_eq!(h.records.put(&caller, &r).unwrap(), WriteResult::Inserted);
        assert_eq!(h.records.get(&caller, "E3").unwrap(), Some(r.clone()));
        assert_eq!(h.records.get(&caller, "E4").unwrap(), None);

        let page = h.records.get_page(&caller, &PageRequest::first(limit(10))).unwrap();
        assert_eq!(page.records, vec![r]);
        assert!(page.is_last());
    }

    #[test]
    fn test_put_overwrites() {
        let h = harness();
        let caller = Identity::generate().caller();
        h.ring.register(&caller).unwrap();

        h.records.put(&caller, &record("E3", "Satya", "Run")).unwrap();
        let updated = record("E3", "Satya", "Swim");
        assert_eq!(h.records.put(&caller, &updated).unwrap(), WriteResult::Replaced);

        let page = h.records.get_page(&caller, &PageRequest::first(limit(10))).unwrap();
        assert_eq!(page.records, vec![updated]);
    }

    #[test]
    fn test_empty_consent_id_rejected() {
        let h = harness();
        let caller = Identity::generate().caller();
        h.ring.register(&caller).unwrap();

        let err = h.records.put(&caller, &record("", "X", "Y")).unwrap_err();
        assert!(matches!(err, VaultError::Validation(_)));
        assert!(h.records.store().is_empty());
    }

    #[test]
    fn test_unknown_caller_is_identity_error() {
        let h = harness();
        let stranger = Identity::generate().caller();

        assert!(matches!(
            h.records.put(&stranger, &record("E3", "Satya", "Run")),
            Err(VaultError::Identity(KeyError::UnknownCaller(_)))
        ));
        assert!(matches!(
            h.records.get_page(&stranger, &PageRequest::first(limit(5))),
            Err(VaultError::Identity(_))
        ));
    }

    #[test]
    fn test_tie_break_on_primary_key() {
        let h = harness();
        let caller = Identity::generate().caller();
        h.ring.register(&caller).unwrap();

        h.records.put(&caller, &record("B", "Ann", "Run")).unwrap();
        h.records.put(&caller, &record("A", "Ann", "Run")).unwrap();

        let first = h.records.get_page(&caller, &PageRequest::first(limit(1))).unwrap();
        assert_eq!(first.records[0].consent_id, "A");
        assert!(!first.is_last());

        let second = h
            .records
            .get_page(&caller, &PageRequest::after(limit(1), first.next_cursor))
            .unwrap();
        assert_eq!(second.records[0].consent_id, "B");
        assert!(second.is_last());
    }

    #[test]
    fn test_limit_revalidated_against_config() {
        let ring = Arc::new(KeyRing::new());
        let store = Arc::new(MemoryStore::new(ring.clone()));
        setup_index(store.as_ref()).unwrap();
        let config = VaultConfig::default().with_max_page_limit(2);
        let records = RecordStore::new(store, ring.clone(), config);
        let caller = Identity::generate().caller();
        ring.register(&caller).unwrap();
        for (id, name) in [("1", "Ann"), ("2", "Bob"), ("3", "Cat")] {
            records.put(&caller, &record(id, name, "Run")).unwrap();
        }

        let page = records
            .get_page(&caller, &PageRequest::first(limit(3)))
            .unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(!page.is_last());
    }

    #[test]
    fn test_page_walks_consent_index_only() {
        let ring = Arc::new(KeyRing::new());
        let store = Arc::new(MemoryStore::new(ring.clone()));
        let mut table = IndexTable::new(CONSENT_INDEX_TABLE, "Consent_ID");
        table.add_index(&["EventName"], false).unwrap();
        table
            .add_index(&["Name", "EventName", "Consent_ID"], false)
            .unwrap();
        store.save_table(&table).unwrap();

        let records = RecordStore::new(store, ring.clone(), VaultConfig::default());
        let caller = Identity::generate().caller();
        ring.register(&caller).unwrap();
        records.put(&caller, &record("1", "Zed", "a")).unwrap();
        records.put(&caller, &record("2", "Amy", "b")).unwrap();

        let page = records
            .get_page(&caller, &PageRequest::first(limit(10)))
            .unwrap();
        let names: Vec<_> = page.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Amy", "Zed"]);
    }

    #[test]
    fn test_malformed_cursor_is_storage_error() {
        let h = harness();
        let caller = Identity::generate().caller();
        h.ring.register(&caller).unwrap();

        let request = PageRequest::after(limit(2), Cursor::from("zz"));
        assert!(matches!(
            h.records.get_page(&caller, &request),
            Err(VaultError::Storage {
                source: StoreError::InvalidCursor(_),
                ..
            })
        ));
    }
}
