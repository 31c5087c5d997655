//! Page-level listing trait and related types.

use async_trait::async_trait;
use bt_error::Result;
use bt_types::ObjectSummary;

/// Request for one page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Prefix every returned key or sub-prefix starts with
    pub prefix: String,

    /// Continuation cursor from the previous page of this prefix
    pub cursor: Option<String>,

    /// Grouping delimiter; `None` lists every key under the prefix flat
    pub delimiter: Option<String>,

    /// Maximum number of keys plus sub-prefixes in the page
    pub page_size: usize,
}

impl PageRequest {
    /// Create a request for the first page of a prefix.
    pub fn new(prefix: impl Into<String>, page_size: usize) -> Self {
        Self {
            prefix: prefix.into(),
            cursor: None,
            delimiter: None,
            page_size,
        }
    }

    /// Group keys by the given delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Resume from a continuation cursor.
    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// One page of listing results.
///
/// `objects` and `sub_prefixes` are disjoint. `next_cursor` is set only when
/// the remote reported that more results exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Cursor for the next page, `None` once the prefix is exhausted
    pub next_cursor: Option<String>,

    /// Objects directly under the prefix
    pub objects: Vec<ObjectSummary>,

    /// Common prefixes one delimiter segment deeper
    pub sub_prefixes: Vec<String>,
}

impl ListingPage {
    /// Whether more pages remain for this prefix.
    pub fn is_truncated(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// A client able to list one page of a namespace.
///
/// Implementations are shared read-only across all workers of a run and
/// must not keep per-traversal state.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// The bucket (namespace) this source lists.
    fn bucket(&self) -> &str;

    /// Fetch one page.
    async fn list_page(&self, request: &PageRequest) -> Result<ListingPage>;
}
