//! S3 listing integration tests using LocalStack.

use crate::common::LocalStackTestContext;
use bt_error::{BtError, ListingError};
use bt_lister::{
    ConcurrentLister, ListApi, ListerConfig, RetryConfig, RetryingPageSource, S3PageSource,
    SequentialLister,
};
use bt_traits::{NamespaceLister, PageRequest, PageSource, entry_channel};
use bt_types::Entry;
use std::collections::BTreeSet;
use std::sync::Arc;

async fn collect(lister: &dyn NamespaceLister) -> Vec<Entry> {
    let (sink, mut stream) = entry_channel(64);
    let consumer = tokio::spawn(async move {
        let mut entries = Vec::new();
        while let Some(entry) = stream.recv().await {
            entries.push(entry);
        }
        entries
    });

    lister.list("", sink).await.unwrap();
    consumer.await.unwrap()
}

fn keys(entries: &[Entry]) -> BTreeSet<String> {
    entries.iter().map(|e| e.key.clone()).collect()
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_grouped_page_from_s3() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "bt-grouped-page";
    ctx.seed_tree(bucket).await.unwrap();

    for api in [ListApi::V2, ListApi::V1] {
        let source = S3PageSource::new(ctx.tally_client(bucket).await, bucket).with_api(api);
        let page = source
            .list_page(&PageRequest::new("", 1000).with_delimiter("/"))
            .await
            .unwrap();

        assert_eq!(page.sub_prefixes, vec!["a/", "b/", "c/", "d/"], "{api}");
        assert!(page.objects.is_empty());
        assert!(!page.is_truncated());
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_concurrent_matches_sequential_on_s3() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "bt-concurrent-listing";
    let written = ctx.seed_tree(bucket).await.unwrap();

    for api in [ListApi::V2, ListApi::V1] {
        let source: Arc<dyn PageSource> = Arc::new(RetryingPageSource::new(
            S3PageSource::new(ctx.tally_client(bucket).await, bucket).with_api(api),
            RetryConfig::new(),
        ));

        let concurrent = ConcurrentLister::new(
            Arc::clone(&source),
            ListerConfig::new()
                .with_page_size(2)
                .with_max_concurrency(10),
        );
        let sequential = SequentialLister::new(source, ListerConfig::new().with_page_size(5));

        let concurrent_entries = collect(&concurrent).await;
        let sequential_entries = collect(&sequential).await;

        assert_eq!(concurrent_entries.len() as u64, written, "{api}");
        assert_eq!(keys(&concurrent_entries), keys(&sequential_entries), "{api}");
        assert!(
            concurrent_entries
                .iter()
                .filter(|e| e.key.starts_with("d/"))
                .all(|e| e.tier == "GLACIER")
        );
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_bucket_fails_without_retrying() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "bt-bucket-that-does-not-exist";
    let source = RetryingPageSource::new(
        S3PageSource::new(ctx.tally_client(bucket).await, bucket),
        RetryConfig::new().with_initial_backoff_ms(1),
    );

    let result = source.list_page(&PageRequest::new("", 10)).await;
    match result {
        Err(BtError::Listing(ListingError::Request { code, status, .. })) => {
            assert_eq!(code.as_deref(), Some("NoSuchBucket"));
            assert_eq!(status, Some(404));
        }
        other => panic!("expected a request error, got {other:?}"),
    }
    assert_eq!(source.retries(), 0);
}
