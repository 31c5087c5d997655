//! Configuration for namespace listers.

use serde::{Deserialize, Serialize};

use crate::queue::DEFAULT_CONCURRENCY;

/// Default maximum keys per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Configuration shared by the listing strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListerConfig {
    /// Delimiter used to group keys into sub-prefixes
    pub delimiter: String,

    /// Maximum keys plus sub-prefixes requested per page
    pub page_size: usize,

    /// Maximum concurrently running listing tasks
    pub max_concurrency: usize,
}

impl Default for ListerConfig {
    fn default() -> Self {
        Self {
            delimiter: "/".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ListerConfig {
    /// Create a new lister configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grouping delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the concurrency ceiling.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}
