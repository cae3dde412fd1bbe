//! String-array entry points.
//!
//! Ledger runtimes hand chaincode a function name and a list of string
//! arguments and expect a byte payload back. [`ConsentContract`] parses those
//! arguments into typed requests for [`RecordStore`] and serializes the
//! result in the established wire shape:
//!
//! ```json
//! {"consentPage":[{"Consent_ID":"E3", "...": "..."}],"lastKey":""}
//! ```

use serde::Serialize;

use consent_vault_core::{ConsentRecord, Cursor};
use consent_vault_keys::{Caller, KeyResolver};
use consent_vault_store::{AssetStore, IndexCatalogBackend};

use crate::catalog::setup_index;
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::records::{PageLimit, PageRequest, RecordStore};

/// Function name for writing a record.
pub const PUT_CONSENT: &str = "PutConsent";
/// Function name for reading a page.
pub const GET_CONSENT_PAGE: &str = "GetConsentPage";
/// Function name for declaring the index.
pub const SETUP_INDEX: &str = "SetupIndex";

#[derive(Serialize)]
struct ConsentPageWire<'a> {
    #[serde(rename = "consentPage")]
    consent_page: &'a [ConsentRecord],
    #[serde(rename = "lastKey")]
    last_key: &'a str,
}

/// The consent contract: dispatch and argument handling.
pub struct ConsentContract<S, K> {
    records: RecordStore<S, K>,
}

impl<S, K> ConsentContract<S, K>
where
    S: AssetStore + IndexCatalogBackend,
    K: KeyResolver,
{
    pub fn new(store: S, keys: K, config: VaultConfig) -> Self {
        Self {
            records: RecordStore::new(store, keys, config),
        }
    }

    /// Wrap an existing record store.
    pub fn from_records(records: RecordStore<S, K>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &RecordStore<S, K> {
        &self.records
    }

    /// Instantiate the contract: declare the index unless disabled.
    pub fn init(&self) -> Result<()> {
        if self.records.config().setup_index_on_init {
            setup_index(self.records.store())?;
        }
        Ok(())
    }

    /// Route `function` to its handler.
    pub fn invoke<A: AsRef<str>>(
        &self,
        caller: &Caller,
        function: &str,
        args: &[A],
    ) -> Result<Vec<u8>> {
        match function {
            PUT_CONSENT => self.put_consent(caller, args),
            GET_CONSENT_PAGE => self.get_consent_page(caller, args),
            SETUP_INDEX => self.setup_index(args),
            other => {
                tracing::warn!(function = other, "unknown function invoked");
                Err(VaultError::Validation(format!(
                    "unknown function {:?}; expected {}, {} or {}",
                    other, PUT_CONSENT, GET_CONSENT_PAGE, SETUP_INDEX
                )))
            }
        }
    }

    /// `PutConsent [jsonRecord]`. Returns an empty payload.
    pub fn put_consent<A: AsRef<str>>(&self, caller: &Caller, args: &[A]) -> Result<Vec<u8>> {
        let [json] = expect_args::<A, 1>(PUT_CONSENT, args)?;
        let record = ConsentRecord::from_json(json.as_ref().as_bytes()).map_err(|e| {
            tracing::warn!(error = %e, "PutConsent payload rejected");
            VaultError::serialization("parsing PutConsent record", e)
        })?;

        self.records.put(caller, &record)?;
        Ok(Vec::new())
    }

    /// `GetConsentPage [limit, previousCursor]`. Returns the page as JSON.
    pub fn get_consent_page<A: AsRef<str>>(&self, caller: &Caller, args: &[A]) -> Result<Vec<u8>> {
        let [limit, cursor] = expect_args::<A, 2>(GET_CONSENT_PAGE, args)?;
        let limit = PageLimit::parse(limit.as_ref(), self.records.config()).map_err(|e| {
            tracing::warn!(error = %e, "GetConsentPage limit rejected");
            e
        })?;
        let request = PageRequest::after(limit, Cursor::from(cursor.as_ref()));

        let page = self.records.get_page(caller, &request)?;
        let wire = ConsentPageWire {
            consent_page: &page.records,
            last_key: page.next_cursor.as_str(),
        };
        serde_json::to_vec(&wire).map_err(|e| VaultError::serialization("encoding consent page", e))
    }

    /// `SetupIndex []`. Returns an empty payload.
    pub fn setup_index<A: AsRef<str>>(&self, args: &[A]) -> Result<Vec<u8>> {
        expect_args::<A, 0>(SETUP_INDEX, args)?;
        setup_index(self.records.store())?;
        Ok(Vec::new())
    }
}

fn expect_args<'a, A, const N: usize>(function: &str, args: &'a [A]) -> Result<&'a [A; N]> {
    args.try_into().map_err(|_| {
        tracing::warn!(function, got = args.len(), expected = N, "wrong argument count");
        VaultError::Validation(format!(
            "{} expects {} argument(s), got {}",
            function,
            N,
            args.len()
        ))
    })
}
