//! The listing-to-summary pipeline.

use bt_aggregate::PathAggregator;
use bt_error::{BtError, Result};
use bt_traits::{NamespaceLister, SnapshotOutput, entry_channel};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::TallyConfig;
use crate::stats::{TallyProgress, TallyStats};

/// Drives one run: a lister feeding a path aggregator whose snapshots go to
/// an output.
///
/// Generic over the lister and output so the same pipeline serves live
/// listings, inventory reports, stdout and in-memory collection.
pub struct Tally<L: NamespaceLister, O: SnapshotOutput> {
    lister: L,
    output: O,
    config: TallyConfig,
    progress: Arc<TallyProgress>,
}

impl<L: NamespaceLister, O: SnapshotOutput> Tally<L, O> {
    /// Create a new pipeline.
    pub fn new(lister: L, output: O, config: TallyConfig) -> Self {
        Self {
            lister,
            output,
            config,
            progress: Arc::new(TallyProgress::default()),
        }
    }

    /// Live counters, for progress reporting while [`run`](Self::run) is pending.
    pub fn progress(&self) -> Arc<TallyProgress> {
        Arc::clone(&self.progress)
    }

    /// The output snapshots are delivered to.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Run the listing and aggregation to completion.
    ///
    /// Throttled snapshots are emitted while the listing is in progress. On
    /// success a final snapshot is emitted and the output flushed. On failure
    /// the error is returned and no final snapshot is produced; snapshots
    /// already emitted stay emitted.
    pub async fn run(&self) -> Result<TallyStats> {
        let mut stats = TallyStats::new();
        let mut aggregator = PathAggregator::new(self.config.aggregate.clone())?;
        let (sink, stream) = entry_channel(self.config.channel_capacity);

        info!(
            lister = self.lister.name(),
            prefix = %self.config.prefix,
            depth = self.config.aggregate.depth,
            output_factor = self.config.aggregate.output_factor,
            "Starting tally"
        );

        let listing = self.lister.list(&self.config.prefix, sink);
        let aggregating = async {
            // Owned here so the receiver closes as soon as aggregation stops
            let mut stream = stream;
            while let Some(entry) = stream.recv().await {
                let size = entry.size;
                if let Some(snapshot) = aggregator.observe(entry)? {
                    self.output.emit(&snapshot).await?;
                    self.progress.record_snapshot();
                    debug!(sequence = snapshot.sequence, observed = snapshot.observed, "Emitted snapshot");
                }
                self.progress.record_entry(size);
            }
            Ok::<(), BtError>(())
        };

        let (listed, aggregated) = tokio::join!(listing, aggregating);

        // An aggregation failure closes the stream, so the lister then fails
        // with a closed-sink error; the aggregation error is the cause.
        stats.listing = match (listed, aggregated) {
            (_, Err(e)) | (Err(e), Ok(())) => {
                error!(
                    error = %e,
                    observed = aggregator.observed(),
                    snapshots = aggregator.emitted(),
                    "Tally failed"
                );
                return Err(e);
            }
            (Ok(listing), Ok(())) => listing,
        };

        let snapshot = aggregator.flush()?;
        self.output.emit(&snapshot).await?;
        self.progress.record_snapshot();
        self.output.flush().await?;

        stats.entries_observed = aggregator.observed();
        stats.bytes_observed = self.progress.bytes();
        stats.snapshots_emitted = aggregator.emitted();
        stats.nodes = snapshot.nodes.len();
        stats.complete();

        info!(
            entries = stats.entries_observed,
            nodes = stats.nodes,
            snapshots = stats.snapshots_emitted,
            "Tally completed"
        );

        Ok(stats)
    }
}
