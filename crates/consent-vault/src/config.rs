//! Vault configuration.

/// Default upper bound on a requested page size.
pub const DEFAULT_MAX_PAGE_LIMIT: usize = 1000;

/// Configuration for the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Largest page a caller may request.
    pub max_page_limit: usize,
    /// Whether [`ConsentContract::init`](crate::ConsentContract::init) declares the index.
    pub setup_index_on_init: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
            setup_index_on_init: true,
        }
    }
}

impl VaultConfig {
    /// Override the page size cap.
    pub fn with_max_page_limit(mut self, max_page_limit: usize) -> Self {
        self.max_page_limit = max_page_limit;
        self
    }
}
