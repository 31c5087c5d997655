//! Sequential flat listing.
//!
//! Walks every key under a prefix with a single cursor loop and no delimiter.
//! Serves as the baseline the concurrent descent is measured against.

use async_stream::try_stream;
use async_trait::async_trait;
use bt_error::Result;
use bt_traits::{
    EntrySink, ListingPage, ListingStats, NamespaceLister, PageRequest, PageSource, forward,
};
use bt_types::Entry;
use futures::{Stream, StreamExt, pin_mut};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ListerConfig;
use crate::stats::RunCounters;

/// Stream every page of one prefix, following continuation cursors.
///
/// The stream ends after the first page without a cursor, or after the
/// first error.
pub fn pages<'a>(
    source: &'a dyn PageSource,
    request: PageRequest,
) -> impl Stream<Item = Result<ListingPage>> + Send + 'a {
    try_stream! {
        let mut request = request;
        loop {
            let page = source.list_page(&request).await?;
            let next_cursor = page.next_cursor.clone();
            yield page;

            match next_cursor {
                Some(cursor) => request = request.with_cursor(Some(cursor)),
                None => break,
            }
        }
    }
}

/// Lists a namespace one page at a time.
pub struct SequentialLister {
    source: Arc<dyn PageSource>,
    config: ListerConfig,
}

impl SequentialLister {
    /// Create a sequential lister over a page source.
    pub fn new(source: Arc<dyn PageSource>, config: ListerConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl NamespaceLister for SequentialLister {
    fn name(&self) -> &'static str {
        "sequential"
    }

    async fn list(&self, prefix: &str, sink: EntrySink) -> Result<ListingStats> {
        info!(
            bucket = %self.source.bucket(),
            prefix = %prefix,
            page_size = self.config.page_size,
            "Starting sequential listing"
        );

        let counters = RunCounters::new();
        let bucket = self.source.bucket();

        counters.record_task();
        let stream = pages(
            self.source.as_ref(),
            PageRequest::new(prefix, self.config.page_size),
        );
        pin_mut!(stream);

        while let Some(page) = stream.next().await {
            let page = page?;
            counters.record_page(page.sub_prefixes.len());
            debug!(objects = page.objects.len(), truncated = page.is_truncated(), "Listed page");

            for object in page.objects {
                counters.record_entry(object.size);
                forward(&sink, Entry::from_summary(bucket, object)).await?;
            }
        }

        let stats = counters.snapshot();
        info!(pages = stats.pages, entries = stats.entries, "Sequential listing finished");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPageSource;
    use bt_traits::entry_channel;

    #[tokio::test]
    async fn test_sequential_lists_every_key_in_order() {
        let mut source = MemoryPageSource::new("bucket");
        for i in 0..7 {
            source = source.with_object(format!("dir{}/key{i}", i % 3), i, "STANDARD");
        }
        let source = Arc::new(source);
        let lister = SequentialLister::new(source.clone(), ListerConfig::new().with_page_size(3));

        let (sink, mut stream) = entry_channel(100);
        let stats = lister.list("", sink).await.unwrap();

        let mut keys = Vec::new();
        while let Some(entry) = stream.recv().await {
            keys.push(entry.key);
        }

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 7);
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.bytes, (0..7).sum::<u64>());
        assert!(source.requests().iter().all(|r| r.delimiter.is_none()));
    }

    #[tokio::test]
    async fn test_pages_follow_cursor_and_stop_on_error() {
        let mut source = MemoryPageSource::new("bucket");
        for i in 0..5 {
            source = source.with_object(format!("k{i}"), 1, "STANDARD");
        }

        let stream = pages(&source, PageRequest::new("", 2));
        let sizes: Vec<usize> = stream
            .map(|page| page.unwrap().objects.len())
            .collect()
            .await;
        assert_eq!(sizes, vec![2, 2, 1]);

        let failing = MemoryPageSource::new("bucket").with_failures("", 1);
        let results: Vec<Result<ListingPage>> =
            pages(&failing, PageRequest::new("", 2)).collect().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[tokio::test]
    async fn test_sequential_empty_prefix_range() {
        let source = MemoryPageSource::new("bucket").with_object("a", 1, "STANDARD");
        let lister = SequentialLister::new(Arc::new(source), ListerConfig::new());

        let (sink, _stream) = entry_channel(10);
        let stats = lister.list("zzz/", sink).await.unwrap();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.pages, 1);
    }
}
