//! Concurrent recursive descent over a delimiter-grouped namespace.
//!
//! Every sub-prefix reported by a page becomes an independent task on the
//! bounded work queue, so parallelism grows with the namespace's branching
//! factor. A flat namespace never reports sub-prefixes and degrades to one
//! task at a time.

use async_trait::async_trait;
use bt_error::Result;
use bt_traits::{EntrySink, ListingStats, NamespaceLister, PageRequest, PageSource, forward};
use bt_types::Entry;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ListerConfig;
use crate::queue::{TaskHandler, WorkQueue};
use crate::stats::RunCounters;

/// One page of work: a prefix and where to resume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTask {
    /// Prefix being listed
    pub prefix: String,

    /// Continuation cursor, `None` for the first page
    pub cursor: Option<String>,

    /// Page size requested from the source
    pub page_size: usize,
}

impl ListingTask {
    /// First page of a prefix.
    pub fn new(prefix: impl Into<String>, page_size: usize) -> Self {
        Self {
            prefix: prefix.into(),
            cursor: None,
            page_size,
        }
    }

    /// The same prefix resumed at `cursor`.
    pub fn resume(self, cursor: String) -> Self {
        Self {
            cursor: Some(cursor),
            ..self
        }
    }
}

/// State owned by one descent run and shared by its workers.
struct RunContext {
    source: Arc<dyn PageSource>,
    delimiter: String,
    sink: EntrySink,
    counters: RunCounters,
}

#[async_trait]
impl TaskHandler<ListingTask> for RunContext {
    async fn handle(&self, task: ListingTask, queue: &WorkQueue<ListingTask>) -> Result<()> {
        self.counters.record_task();

        let request = PageRequest::new(task.prefix.clone(), task.page_size)
            .with_delimiter(self.delimiter.clone())
            .with_cursor(task.cursor.clone());

        let page = self.source.list_page(&request).await?;
        self.counters.record_page(page.sub_prefixes.len());

        debug!(
            prefix = %task.prefix,
            objects = page.objects.len(),
            sub_prefixes = page.sub_prefixes.len(),
            truncated = page.is_truncated(),
            "Listed page"
        );

        for sub_prefix in page.sub_prefixes {
            queue.enqueue(ListingTask::new(sub_prefix, task.page_size))?;
        }

        let bucket = self.source.bucket();
        for object in page.objects {
            self.counters.record_entry(object.size);
            forward(&self.sink, Entry::from_summary(bucket, object)).await?;
        }

        if let Some(cursor) = page.next_cursor {
            queue.enqueue(task.resume(cursor))?;
        }

        Ok(())
    }
}

/// Lists a namespace by fanning out one task per discovered sub-prefix.
pub struct ConcurrentLister {
    source: Arc<dyn PageSource>,
    config: ListerConfig,
}

impl ConcurrentLister {
    /// Create a concurrent lister over a shared page source.
    pub fn new(source: Arc<dyn PageSource>, config: ListerConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl NamespaceLister for ConcurrentLister {
    fn name(&self) -> &'static str {
        "concurrent"
    }

    async fn list(&self, prefix: &str, sink: EntrySink) -> Result<ListingStats> {
        info!(
            bucket = %self.source.bucket(),
            prefix = %prefix,
            max_concurrency = self.config.max_concurrency,
            page_size = self.config.page_size,
            "Starting concurrent listing"
        );

        let context = Arc::new(RunContext {
            source: Arc::clone(&self.source),
            delimiter: self.config.delimiter.clone(),
            sink,
            counters: RunCounters::new(),
        });

        let (queue, drained) = WorkQueue::new(self.config.max_concurrency, context.clone());
        queue.enqueue(ListingTask::new(prefix, self.config.page_size))?;
        let queue_stats = queue.stats();
        drop(queue);

        let outcome = drained.wait().await;
        let stats = context.counters.snapshot();

        info!(
            tasks = stats.tasks,
            entries = stats.entries,
            prefixes = stats.prefixes,
            peak_in_flight = queue_stats.peak_in_flight(),
            discarded = queue_stats.discarded(),
            success = outcome.is_ok(),
            "Concurrent listing finished"
        );

        outcome.map(|()| stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPageSource;
    use crate::walk::SequentialLister;
    use bt_error::{BtError, ListingError};
    use bt_traits::entry_channel;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn namespace() -> MemoryPageSource {
        let mut source = MemoryPageSource::new("bucket");
        for dir in ["a", "b", "c", "d"] {
            for i in 0..5 {
                source = source.with_object(format!("{dir}/obj{i}"), i, "STANDARD");
            }
            source = source.with_object(format!("{dir}/deep/x/y"), 100, "GLACIER");
        }
        source.with_object("top-level", 7, "STANDARD_IA")
    }

    async fn collect(lister: &dyn NamespaceLister, prefix: &str) -> (Result<ListingStats>, Vec<Entry>) {
        let (sink, mut stream) = entry_channel(16);
        let prefix = prefix.to_string();

        let consumer = tokio::spawn(async move {
            let mut entries = Vec::new();
            while let Some(entry) = stream.recv().await {
                entries.push(entry);
            }
            entries
        });

        let result = lister.list(&prefix, sink).await;
        let entries = consumer.await.unwrap();
        (result, entries)
    }

    fn keys(entries: &[Entry]) -> BTreeSet<String> {
        entries.iter().map(|e| e.key.clone()).collect()
    }

    #[tokio::test]
    async fn test_fan_out_one_task_per_sub_prefix() {
        let source = Arc::new(namespace());
        let lister = ConcurrentLister::new(
            source.clone(),
            ListerConfig::new().with_max_concurrency(10),
        );

        let (result, entries) = collect(&lister, "").await;
        let stats = result.unwrap();

        let first_pages: Vec<String> = source
            .requests()
            .into_iter()
            .filter(|r| r.cursor.is_none())
            .map(|r| r.prefix)
            .collect();
        for prefix in ["a/", "b/", "c/", "d/"] {
            assert_eq!(
                first_pages.iter().filter(|p| p.as_str() == prefix).count(),
                1,
                "prefix {prefix}"
            );
        }

        assert_eq!(entries.len(), 4 * 6 + 1);
        assert_eq!(stats.entries, entries.len() as u64);
        assert!(entries.iter().all(|e| e.bucket == "bucket"));
    }

    #[tokio::test]
    async fn test_matches_sequential_descent() {
        let concurrent = ConcurrentLister::new(
            Arc::new(namespace()),
            ListerConfig::new()
                .with_max_concurrency(10)
                .with_page_size(2),
        );
        let sequential = SequentialLister::new(
            Arc::new(namespace()),
            ListerConfig::new().with_page_size(3),
        );

        let (concurrent_result, concurrent_entries) = collect(&concurrent, "").await;
        let (sequential_result, sequential_entries) = collect(&sequential, "").await;
        concurrent_result.unwrap();
        sequential_result.unwrap();

        assert_eq!(concurrent_entries.len(), sequential_entries.len());
        assert_eq!(keys(&concurrent_entries), keys(&sequential_entries));
    }

    #[tokio::test]
    async fn test_pages_within_prefix_stay_ordered() {
        let mut source = MemoryPageSource::new("bucket").with_latency(Duration::from_millis(1));
        for i in 0..20 {
            source = source.with_object(format!("p/{i:03}"), 1, "STANDARD");
            source = source.with_object(format!("q/{i:03}"), 1, "STANDARD");
        }
        let lister = ConcurrentLister::new(
            Arc::new(source),
            ListerConfig::new()
                .with_page_size(3)
                .with_max_concurrency(4),
        );

        let (result, entries) = collect(&lister, "").await;
        result.unwrap();

        for dir in ["p/", "q/"] {
            let in_dir: Vec<&str> = entries
                .iter()
                .map(|e| e.key.as_str())
                .filter(|k| k.starts_with(dir))
                .collect();
            let mut sorted = in_dir.clone();
            sorted.sort();
            assert_eq!(in_dir, sorted);
            assert_eq!(in_dir.len(), 20);
        }
    }

    #[tokio::test]
    async fn test_listing_under_prefix() {
        let lister = ConcurrentLister::new(Arc::new(namespace()), ListerConfig::new());

        let (result, entries) = collect(&lister, "b/").await;
        result.unwrap();

        assert_eq!(entries.len(), 6);
        assert!(entries.iter().all(|e| e.key.starts_with("b/")));
    }

    #[tokio::test]
    async fn test_flat_namespace_runs_single_task_chain() {
        let mut source = MemoryPageSource::new("bucket");
        for i in 0..10 {
            source = source.with_object(format!("file{i}"), 1, "STANDARD");
        }
        let lister = ConcurrentLister::new(
            Arc::new(source),
            ListerConfig::new().with_page_size(4),
        );

        let (result, entries) = collect(&lister, "").await;
        let stats = result.unwrap();

        assert_eq!(entries.len(), 10);
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.prefixes, 0);
    }

    #[tokio::test]
    async fn test_failure_fails_run_but_keeps_emitted_entries() {
        let source = namespace().with_failures("c/deep/", 1);
        let lister = ConcurrentLister::new(
            Arc::new(source),
            ListerConfig::new().with_max_concurrency(2),
        );

        let (result, entries) = collect(&lister, "").await;

        match result {
            Err(BtError::Listing(error @ ListingError::Request { .. })) => {
                assert_eq!(error.prefix(), "c/deep/");
            }
            other => panic!("expected listing error, got {other:?}"),
        }
        // Whatever was forwarded before the failure reached the consumer
        assert!(!entries.is_empty());
        assert!(entries.len() < 4 * 6 + 1);
    }

    #[tokio::test]
    async fn test_dropped_consumer_fails_run() {
        let lister = ConcurrentLister::new(Arc::new(namespace()), ListerConfig::new());
        let (sink, stream) = entry_channel(1);
        drop(stream);

        let result = lister.list("", sink).await;
        assert!(matches!(result, Err(BtError::Pipeline(_))));
    }

    #[test]
    fn test_listing_task_resume_keeps_prefix() {
        let task = ListingTask::new("a/", 10).resume("a/5".to_string());
        assert_eq!(task.prefix, "a/");
        assert_eq!(task.cursor.as_deref(), Some("a/5"));
        assert_eq!(task.page_size, 10);
    }
}
