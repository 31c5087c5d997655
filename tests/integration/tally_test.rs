//! End-to-end tally tests using LocalStack.

use crate::common::LocalStackTestContext;
use bt_aggregate::AggregateConfig;
use bt_lister::{ConcurrentLister, ListerConfig, RetryConfig, RetryingPageSource, S3PageSource};
use bt_tally::{CollectingOutput, Tally, TallyConfig};
use bt_types::StorageTier;
use std::sync::Arc;

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_tally_bucket_tree() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "bt-tally-tree";
    let written = ctx.seed_tree(bucket).await.unwrap();

    let source = Arc::new(RetryingPageSource::new(
        S3PageSource::new(ctx.tally_client(bucket).await, bucket),
        RetryConfig::new(),
    ));
    let lister = ConcurrentLister::new(source, ListerConfig::new().with_max_concurrency(10));
    let config = TallyConfig::new().with_aggregate(
        AggregateConfig::new()
            .with_depth(2)
            .with_output_factor(5),
    );

    let tally = Tally::new(lister, CollectingOutput::new(), config);
    let stats = tally.run().await.unwrap();

    assert_eq!(stats.entries_observed, written);
    assert_eq!(stats.snapshots_emitted, written / 5 + 1);

    let last = tally.output().last().unwrap();
    assert!(last.is_final);
    // bucket + 4 top-level + 8 second-level directories
    assert_eq!(last.nodes.len(), 13);

    let root = last.node(bucket).unwrap();
    assert_eq!(root.total_count(), written);
    assert_eq!(root.tier(StorageTier::Glacier).count, 6);
    assert_eq!(root.tier(StorageTier::Glacier).total_size, 60);

    let d_x = last.node(&format!("{bucket}/d/x")).unwrap();
    assert_eq!(d_x.tier(StorageTier::Glacier).count, 3);
    assert_eq!(d_x.tier(StorageTier::Standard).count, 0);
}
