//! The incremental path aggregation engine.

use bt_error::{BtError, EntryError, Result};
use bt_types::{AggregationNode, Entry, Snapshot, StorageTier};
use tracing::{debug, trace};

use crate::config::AggregateConfig;
use crate::path::derive_paths;

/// Lifecycle of one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// Observations are accepted
    Accepting,
    /// End of input signalled, final snapshot being produced
    Finalizing,
    /// Final snapshot produced; no further input accepted
    Closed,
}

/// Folds a stream of entries into a sorted, depth-bounded usage summary.
///
/// Calls are expected to be serialized by the caller; the engine holds no
/// locks. Every `output_factor`-th accepted observation yields a snapshot,
/// and [`flush`](PathAggregator::flush) always yields a final one, even when
/// it repeats the last throttled snapshot.
#[derive(Debug)]
pub struct PathAggregator {
    config: AggregateConfig,

    /// Nodes kept sorted by path.
    nodes: Vec<AggregationNode>,

    /// Accepted observations.
    observed: u64,

    /// Snapshots emitted so far.
    emitted: u64,

    state: AggregatorState,
}

impl PathAggregator {
    /// Create an aggregator, validating the configuration.
    pub fn new(config: AggregateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: Vec::new(),
            observed: 0,
            emitted: 0,
            state: AggregatorState::Accepting,
        })
    }

    /// Observe one entry.
    ///
    /// Returns a snapshot when this observation lands on the throttling
    /// boundary. A rejected entry leaves all state, including the observation
    /// counter, untouched.
    pub fn observe(&mut self, entry: Entry) -> Result<Option<Snapshot>> {
        if self.state != AggregatorState::Accepting {
            return Err(BtError::Pipeline(format!(
                "aggregator is {:?}, cannot observe '{}'",
                self.state, entry.key
            )));
        }

        let tier = validate(&entry)?;
        let paths = derive_paths(
            &entry.bucket,
            &entry.key,
            &self.config.delimiter,
            self.config.depth,
        );

        for path in paths {
            let index = self.node_index(path);
            self.nodes[index].record(tier, entry.size);
        }

        self.observed += 1;

        if self.observed % self.config.output_factor == 0 {
            Ok(Some(self.emit(false)))
        } else {
            Ok(None)
        }
    }

    /// Signal end of input and produce the final snapshot.
    pub fn flush(&mut self) -> Result<Snapshot> {
        if self.state != AggregatorState::Accepting {
            return Err(BtError::Pipeline(format!(
                "aggregator is {:?}, cannot flush again",
                self.state
            )));
        }

        self.state = AggregatorState::Finalizing;
        let snapshot = self.emit(true);
        self.state = AggregatorState::Closed;

        debug!(
            observed = self.observed,
            nodes = self.nodes.len(),
            snapshots = self.emitted,
            "Aggregation closed"
        );

        Ok(snapshot)
    }

    /// Copy of the current summary without emitting it.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sequence: self.emitted,
            observed: self.observed,
            is_final: self.state == AggregatorState::Closed,
            nodes: self.nodes.clone(),
        }
    }

    /// Current nodes, sorted by path.
    pub fn nodes(&self) -> &[AggregationNode] {
        &self.nodes
    }

    /// Number of accepted observations.
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Number of snapshots emitted, including the final one.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AggregatorState {
        self.state
    }

    /// The configuration in use.
    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// Find the node for `path`, inserting a zeroed one at its sorted position.
    fn node_index(&mut self, path: String) -> usize {
        match self
            .nodes
            .binary_search_by(|node| node.path.as_str().cmp(path.as_str()))
        {
            Ok(index) => index,
            Err(index) => {
                trace!(path = %path, index, "Tracking new path");
                self.nodes.insert(index, AggregationNode::new(path));
                index
            }
        }
    }

    fn emit(&mut self, is_final: bool) -> Snapshot {
        self.emitted += 1;
        debug!(
            sequence = self.emitted,
            observed = self.observed,
            nodes = self.nodes.len(),
            is_final,
            "Emitting snapshot"
        );
        Snapshot {
            sequence: self.emitted,
            observed: self.observed,
            is_final,
            nodes: self.nodes.clone(),
        }
    }
}

/// Check the required fields and resolve the tier.
fn validate(entry: &Entry) -> Result<StorageTier> {
    if entry.bucket.is_empty() {
        return Err(EntryError::Malformed(format!("entry '{}' has no bucket", entry.key)).into());
    }
    if entry.key.is_empty() {
        return Err(
            EntryError::Malformed(format!("entry in bucket '{}' has no key", entry.bucket)).into(),
        );
    }

    entry.tier.parse::<StorageTier>().map_err(|tier| {
        EntryError::UnknownTier {
            tier,
            key: entry.key.clone(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_types::TierTotals;

    fn aggregator(depth: usize, output_factor: u64) -> PathAggregator {
        PathAggregator::new(
            AggregateConfig::new()
                .with_depth(depth)
                .with_output_factor(output_factor),
        )
        .unwrap()
    }

    fn totals(count: u64, total_size: u64) -> TierTotals {
        TierTotals { count, total_size }
    }

    #[test]
    fn test_end_to_end_example() {
        let mut agg = aggregator(2, 1);

        agg.observe(Entry::new("bucket", "a/b/1", 10, "STANDARD"))
            .unwrap();
        agg.observe(Entry::new("bucket", "a/b/2", 20, "STANDARD"))
            .unwrap();
        let snapshot = agg
            .observe(Entry::new("bucket", "a/b/3", 30, "GLACIER"))
            .unwrap()
            .expect("output factor 1 emits on every observation");

        let paths: Vec<&str> = snapshot.nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["bucket", "bucket/a", "bucket/a/b"]);

        for node in &snapshot.nodes {
            assert_eq!(node.tier(StorageTier::Standard), totals(2, 30));
            assert_eq!(node.tier(StorageTier::Glacier), totals(1, 30));
            assert_eq!(node.tier(StorageTier::DeepArchive), totals(0, 0));
        }
        assert_eq!(snapshot.sequence, 3);
        assert_eq!(snapshot.observed, 3);
        assert!(!snapshot.is_final);
    }

    #[test]
    fn test_unknown_tier_rejected_without_state_change() {
        let mut agg = aggregator(1, 1);
        agg.observe(Entry::new("bucket", "a/1", 5, "STANDARD"))
            .unwrap();
        let before = agg.snapshot();

        let result = agg.observe(Entry::new("bucket", "z/2", 7, "UNKNOWN"));
        assert!(matches!(
            result,
            Err(BtError::Entry(EntryError::UnknownTier { ref tier, .. })) if tier == "UNKNOWN"
        ));

        assert_eq!(agg.snapshot(), before);
        assert_eq!(agg.observed(), 1);
        assert!(agg.nodes().iter().all(|n| n.path != "bucket/z"));
    }

    #[test]
    fn test_malformed_entries_rejected() {
        let mut agg = aggregator(1, 1);
        assert!(matches!(
            agg.observe(Entry::new("", "a/1", 5, "STANDARD")),
            Err(BtError::Entry(EntryError::Malformed(_)))
        ));
        assert!(matches!(
            agg.observe(Entry::new("bucket", "", 5, "STANDARD")),
            Err(BtError::Entry(EntryError::Malformed(_)))
        ));
        assert_eq!(agg.observed(), 0);
        assert!(agg.nodes().is_empty());
    }

    #[test]
    fn test_nodes_stay_sorted() {
        let mut agg = aggregator(3, 1000);
        let keys = [
            "z/y/x", "a/b/c", "m/n", "a/a/a", "a-b/c", "a/b/d", "0/1", "z/a/b", "m/n/o/p",
        ];

        for key in keys {
            agg.observe(Entry::new("bucket", key, 1, "STANDARD")).unwrap();
            let paths: Vec<&str> = agg.nodes().iter().map(|n| n.path.as_str()).collect();
            let mut sorted = paths.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(paths, sorted);
        }
    }

    #[test]
    fn test_aggregation_is_monotonic() {
        let mut agg = aggregator(2, 1);
        let entries = [
            ("a/x/1", 10, "STANDARD"),
            ("a/y/2", 0, "GLACIER"),
            ("b/3", 7, "STANDARD"),
            ("a/x/4", 3, "STANDARD_IA"),
            ("5", 100, "STANDARD"),
        ];

        let mut previous: Option<Snapshot> = None;
        for (key, size, tier) in entries {
            let snapshot = agg
                .observe(Entry::new("bucket", key, size, tier))
                .unwrap()
                .unwrap();

            if let Some(prev) = &previous {
                for old in &prev.nodes {
                    let new = snapshot.node(&old.path).expect("nodes are never removed");
                    for (tier, old_totals) in &old.tiers {
                        let new_totals = new.tier(*tier);
                        assert!(new_totals.count >= old_totals.count);
                        assert!(new_totals.total_size >= old_totals.total_size);
                    }
                }
            }
            previous = Some(snapshot);
        }
    }

    #[test]
    fn test_throttled_emission_count() {
        for (n, factor) in [(0u64, 3u64), (1, 1), (10, 3), (9, 3), (250, 100), (7, 10)] {
            let mut agg = aggregator(1, factor);
            let mut throttled = 0;

            for i in 0..n {
                let key = format!("dir{}/obj{}", i % 4, i);
                if agg
                    .observe(Entry::new("bucket", key, i, "STANDARD"))
                    .unwrap()
                    .is_some()
                {
                    throttled += 1;
                }
            }

            assert_eq!(throttled, n / factor, "n={n} factor={factor}");

            let last = agg.flush().unwrap();
            assert!(last.is_final);
            assert_eq!(agg.emitted(), n / factor + 1);
        }
    }

    #[test]
    fn test_final_snapshot_may_repeat_throttled() {
        let mut agg = aggregator(0, 2);
        agg.observe(Entry::new("bucket", "a", 1, "STANDARD")).unwrap();
        let throttled = agg
            .observe(Entry::new("bucket", "b", 1, "STANDARD"))
            .unwrap()
            .unwrap();

        let last = agg.flush().unwrap();
        assert_eq!(last.nodes, throttled.nodes);
        assert_eq!(last.sequence, throttled.sequence + 1);
    }

    #[test]
    fn test_closed_aggregator_rejects_input() {
        let mut agg = aggregator(0, 100);
        agg.observe(Entry::new("bucket", "a", 1, "STANDARD")).unwrap();
        agg.flush().unwrap();

        assert_eq!(agg.state(), AggregatorState::Closed);
        assert!(matches!(
            agg.observe(Entry::new("bucket", "b", 1, "STANDARD")),
            Err(BtError::Pipeline(_))
        ));
        assert!(matches!(agg.flush(), Err(BtError::Pipeline(_))));
    }

    #[test]
    fn test_flush_without_input() {
        let mut agg = aggregator(2, 100);
        let snapshot = agg.flush().unwrap();

        assert!(snapshot.is_final);
        assert!(snapshot.nodes.is_empty());
        assert_eq!(snapshot.observed, 0);
    }

    #[test]
    fn test_multiple_buckets_share_summary() {
        let mut agg = aggregator(1, 100);
        agg.observe(Entry::new("beta", "x/1", 4, "STANDARD")).unwrap();
        agg.observe(Entry::new("alpha", "x/1", 6, "STANDARD")).unwrap();

        let paths: Vec<&str> = agg.nodes().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["alpha", "alpha/x", "beta", "beta/x"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(PathAggregator::new(AggregateConfig::new().with_output_factor(0)).is_err());
    }
}
