//! Main execution logic for the bt-tally CLI.

use anyhow::{Context, Result, anyhow, bail};
use bt_aggregate::AggregateConfig;
use bt_inventory::{InventoryConfig, InventoryLister};
use bt_lister::{
    ConcurrentLister, ListerConfig, RetryConfig, RetryingPageSource, S3Config, S3PageSource,
    SequentialLister, create_s3_client,
};
use bt_tally::{StdoutOutput, Tally, TallyConfig, TallyStats};
use bt_traits::{NamespaceLister, PageSource};
use std::sync::Arc;
use tracing::debug;

use crate::args::{Cli, Mode};
use crate::progress::ProgressReporter;

/// What a finished run reports back to `main`.
#[derive(Debug)]
pub struct RunSummary {
    /// Pipeline statistics
    pub stats: TallyStats,

    /// Retried list requests; `None` when the run issued no list requests
    pub retries: Option<u64>,
}

type S3Source = RetryingPageSource<S3PageSource>;

/// Execute a tally with the provided arguments.
pub async fn execute(args: Cli) -> Result<RunSummary> {
    let aggregate = AggregateConfig::new()
        .with_delimiter(&args.delimiter)
        .with_depth(args.depth)
        .with_output_factor(args.output_factor);
    let config = TallyConfig::new()
        .with_prefix(&args.prefix)
        .with_channel_capacity(args.channel_capacity)
        .with_aggregate(aggregate);
    let output =
        StdoutOutput::new(args.output_format.into()).with_final_only(args.final_only);

    debug!(?config, mode = ?args.mode, "Resolved configuration");

    match args.mode {
        Mode::Inventory => {
            let manifest = args
                .manifest
                .as_ref()
                .ok_or_else(|| anyhow!("--manifest is required when --mode inventory"))?;
            let mut inventory = InventoryConfig::new(manifest);
            if let Some(data_dir) = &args.data_dir {
                inventory = inventory.with_data_dir(data_dir);
            }
            let stats = run_tally(InventoryLister::new(inventory), output, config, &args).await?;
            Ok(RunSummary {
                stats,
                retries: None,
            })
        }
        Mode::Concurrent => {
            let source = page_source(&args).await?;
            let lister = ConcurrentLister::new(source.clone(), lister_config(&args));
            let stats = run_tally(lister, output, config, &args).await?;
            Ok(RunSummary {
                stats,
                retries: Some(source.retries()),
            })
        }
        Mode::Sequential => {
            let source = page_source(&args).await?;
            let lister = SequentialLister::new(source.clone(), lister_config(&args));
            let stats = run_tally(lister, output, config, &args).await?;
            Ok(RunSummary {
                stats,
                retries: Some(source.retries()),
            })
        }
    }
}

fn lister_config(args: &Cli) -> ListerConfig {
    ListerConfig::new()
        .with_delimiter(&args.delimiter)
        .with_page_size(args.page_size)
        .with_max_concurrency(args.concurrency)
}

/// Build the retrying S3 page source.
///
/// Kept concretely typed so the retry count can be read after the run.
async fn page_source(args: &Cli) -> Result<Arc<S3Source>> {
    let bucket = args
        .bucket
        .as_ref()
        .ok_or_else(|| anyhow!("--bucket (or BT_S3_BUCKET) is required for live listings"))?;

    let mut s3_config = S3Config::new(bucket)
        .with_region(&args.region)
        .with_timeout(args.timeout);

    if let Some(endpoint) = &args.s3_endpoint {
        s3_config = s3_config.with_endpoint(endpoint);
    }

    match (&args.access_key, &args.secret_key) {
        (Some(access_key), Some(secret_key)) => {
            s3_config = s3_config.with_credentials(access_key, secret_key);
        }
        (None, None) => {}
        _ => bail!("--access-key and --secret-key must be given together"),
    }

    if let Some(profile) = &args.profile {
        s3_config = s3_config.with_profile(profile);
    }

    let client = create_s3_client(&s3_config)
        .await
        .context("failed to create S3 client")?;
    let source = S3PageSource::new(client, bucket).with_api(args.list_api.into());
    let retry = RetryConfig::new().with_max_attempts(args.max_attempts);

    debug!(
        bucket = %source.bucket(),
        api = %source.api(),
        max_attempts = retry.max_attempts,
        "Created S3 page source"
    );

    Ok(Arc::new(RetryingPageSource::new(source, retry)))
}

/// Run the pipeline with a specific lister.
async fn run_tally<L: NamespaceLister>(
    lister: L,
    output: StdoutOutput,
    config: TallyConfig,
    args: &Cli,
) -> Result<TallyStats> {
    let tally = Tally::new(lister, output, config);

    let mut reporter = args
        .progress
        .then(|| ProgressReporter::new(tally.progress(), args.progress_interval));
    if let Some(reporter) = reporter.as_mut() {
        reporter.start();
    }

    let result = tally.run().await;

    if let Some(reporter) = reporter {
        reporter.stop().await;
    }

    Ok(result?)
}
