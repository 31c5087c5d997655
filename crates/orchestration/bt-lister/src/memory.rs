//! In-memory page source.
//!
//! Reproduces the grouping and pagination semantics of a delimiter-aware
//! object listing over a fixed set of keys. Used as a local baseline and in
//! tests, with optional latency and injected transient failures.

use async_trait::async_trait;
use bt_error::{ListingError, Result};
use bt_traits::{ListingPage, PageRequest, PageSource};
use bt_types::ObjectSummary;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::time::Duration;

/// A [`PageSource`] backed by an in-memory key set.
pub struct MemoryPageSource {
    bucket: String,
    objects: BTreeMap<String, ObjectSummary>,
    latency: Option<Duration>,
    /// Remaining injected failures per prefix.
    failures: Mutex<HashMap<String, u32>>,
    /// Every request received, in arrival order.
    requests: Mutex<Vec<PageRequest>>,
}

impl MemoryPageSource {
    /// Create an empty source for a bucket.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: BTreeMap::new(),
            latency: None,
            failures: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Add one object.
    pub fn with_object(mut self, key: impl Into<String>, size: u64, tier: impl Into<String>) -> Self {
        let summary = ObjectSummary::new(key, size, tier);
        self.objects.insert(summary.key.clone(), summary);
        self
    }

    /// Delay every response.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `times` requests for `prefix` with a transient error.
    pub fn with_failures(self, prefix: impl Into<String>, times: u32) -> Self {
        self.failures.lock().insert(prefix.into(), times);
        self
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Copy of every request received so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }

    fn take_failure(&self, prefix: &str) -> bool {
        let mut failures = self.failures.lock();
        match failures.get_mut(prefix) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn page(&self, request: &PageRequest) -> ListingPage {
        let prefix = request.prefix.as_str();
        let page_size = request.page_size.max(1);
        let delimiter = request.delimiter.as_deref().filter(|d| !d.is_empty());
        let rolled_cursor = request
            .cursor
            .as_deref()
            .filter(|cursor| is_common_prefix(cursor, prefix, delimiter));

        let mut page = ListingPage::default();
        let mut taken = 0;
        let mut last: Option<String> = None;

        let range = self
            .objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded));

        for (key, summary) in range {
            if !key.starts_with(prefix) {
                break;
            }
            if let Some(cursor) = request.cursor.as_deref() {
                if key.as_str() <= cursor {
                    continue;
                }
            }
            if let Some(rolled) = rolled_cursor {
                if key.starts_with(rolled) {
                    continue;
                }
            }

            let common_prefix = delimiter.and_then(|d| {
                key[prefix.len()..]
                    .find(d)
                    .map(|i| key[..prefix.len() + i + d.len()].to_string())
            });

            if let Some(cp) = &common_prefix {
                if page.sub_prefixes.last() == Some(cp) {
                    continue;
                }
            }

            if taken == page_size {
                page.next_cursor = last;
                return page;
            }
            taken += 1;

            match common_prefix {
                Some(cp) => {
                    last = Some(cp.clone());
                    page.sub_prefixes.push(cp);
                }
                None => {
                    last = Some(key.clone());
                    page.objects.push(summary.clone());
                }
            }
        }

        page
    }
}

/// Whether a cursor names a rolled-up common prefix rather than an object key.
fn is_common_prefix(cursor: &str, prefix: &str, delimiter: Option<&str>) -> bool {
    match (delimiter, cursor.strip_prefix(prefix)) {
        (Some(d), Some(rest)) => !rest.is_empty() && rest.contains(d),
        _ => false,
    }
}

#[async_trait]
impl PageSource for MemoryPageSource {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_page(&self, request: &PageRequest) -> Result<ListingPage> {
        self.requests.lock().push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.take_failure(&request.prefix) {
            return Err(ListingError::Request {
                prefix: request.prefix.clone(),
                code: Some("ServiceUnavailable".to_string()),
                status: Some(503),
                message: "503 Service Unavailable (injected)".to_string(),
            }
            .into());
        }

        Ok(self.page(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemoryPageSource {
        MemoryPageSource::new("bucket")
            .with_object("a/1", 1, "STANDARD")
            .with_object("a/2", 2, "STANDARD")
            .with_object("a/x/3", 3, "GLACIER")
            .with_object("b/4", 4, "STANDARD")
            .with_object("c", 5, "STANDARD")
            .with_object("d/e/f/6", 6, "STANDARD")
    }

    #[tokio::test]
    async fn test_grouped_listing() {
        let page = source()
            .list_page(&PageRequest::new("", 100).with_delimiter("/"))
            .await
            .unwrap();

        assert_eq!(page.sub_prefixes, vec!["a/", "b/", "d/"]);
        let keys: Vec<&str> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["c"]);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_grouped_listing_under_prefix() {
        let page = source()
            .list_page(&PageRequest::new("a/", 100).with_delimiter("/"))
            .await
            .unwrap();

        assert_eq!(page.sub_prefixes, vec!["a/x/"]);
        let keys: Vec<&str> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a/1", "a/2"]);
    }

    #[tokio::test]
    async fn test_flat_listing() {
        let page = source()
            .list_page(&PageRequest::new("a/", 100))
            .await
            .unwrap();

        assert!(page.sub_prefixes.is_empty());
        assert_eq!(page.objects.len(), 3);
    }

    #[tokio::test]
    async fn test_pagination_reports_each_prefix_once() {
        let source = source();
        let mut request = PageRequest::new("", 1).with_delimiter("/");
        let mut prefixes = Vec::new();
        let mut keys = Vec::new();
        let mut pages = 0;

        loop {
            let page = source.list_page(&request).await.unwrap();
            pages += 1;
            prefixes.extend(page.sub_prefixes);
            keys.extend(page.objects.into_iter().map(|o| o.key));
            match page.next_cursor {
                Some(cursor) => request = request.with_cursor(Some(cursor)),
                None => break,
            }
        }

        assert_eq!(pages, 4);
        assert_eq!(prefixes, vec!["a/", "b/", "d/"]);
        assert_eq!(keys, vec!["c"]);
    }

    #[tokio::test]
    async fn test_exact_page_is_not_truncated() {
        let source = MemoryPageSource::new("bucket")
            .with_object("k1", 1, "STANDARD")
            .with_object("k2", 1, "STANDARD");

        let page = source.list_page(&PageRequest::new("", 2)).await.unwrap();
        assert_eq!(page.objects.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_directory_marker_is_an_object() {
        let source = MemoryPageSource::new("bucket")
            .with_object("p/", 0, "STANDARD")
            .with_object("p/file", 1, "STANDARD");

        let page = source
            .list_page(&PageRequest::new("p/", 1).with_delimiter("/"))
            .await
            .unwrap();
        assert_eq!(page.objects[0].key, "p/");

        let cursor = page.next_cursor.clone();
        assert_eq!(cursor.as_deref(), Some("p/"));
        let page = source
            .list_page(
                &PageRequest::new("p/", 1)
                    .with_delimiter("/")
                    .with_cursor(cursor),
            )
            .await
            .unwrap();
        assert_eq!(page.objects[0].key, "p/file");
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let source = source().with_failures("a/", 1);

        assert!(source.list_page(&PageRequest::new("a/", 10)).await.is_err());
        assert!(source.list_page(&PageRequest::new("a/", 10)).await.is_ok());
        assert!(source.list_page(&PageRequest::new("b/", 10)).await.is_ok());
        assert_eq!(source.request_count(), 3);
    }
}
