//! Aggregated usage summary types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::StorageTier;

/// Object count and byte total for one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTotals {
    /// Number of objects observed
    pub count: u64,

    /// Sum of object sizes in bytes
    pub total_size: u64,
}

impl TierTotals {
    /// Record one object of the given size.
    pub fn add(&mut self, size: u64) {
        self.count = self.count.saturating_add(1);
        self.total_size = self.total_size.saturating_add(size);
    }
}

/// Usage totals for one path (the bucket root or an ancestor directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationNode {
    /// Path of the node, rooted at the bucket name
    pub path: String,

    /// Totals per tier; every known tier is present
    pub tiers: BTreeMap<StorageTier, TierTotals>,
}

impl AggregationNode {
    /// Create a node with every tier initialised to zero.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tiers: StorageTier::ALL
                .iter()
                .map(|tier| (*tier, TierTotals::default()))
                .collect(),
        }
    }

    /// Record one object in the given tier.
    pub fn record(&mut self, tier: StorageTier, size: u64) {
        self.tiers.entry(tier).or_default().add(size);
    }

    /// Totals for one tier.
    pub fn tier(&self, tier: StorageTier) -> TierTotals {
        self.tiers.get(&tier).copied().unwrap_or_default()
    }

    /// Object count across all tiers.
    pub fn total_count(&self) -> u64 {
        self.tiers
            .values()
            .fold(0u64, |acc, t| acc.saturating_add(t.count))
    }

    /// Byte total across all tiers.
    pub fn total_size(&self) -> u64 {
        self.tiers
            .values()
            .fold(0u64, |acc, t| acc.saturating_add(t.total_size))
    }
}

/// A point-in-time copy of the full summary, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// 1-based emission sequence within the run
    pub sequence: u64,

    /// Number of entries observed when the snapshot was taken
    pub observed: u64,

    /// Whether this is the end-of-input snapshot
    pub is_final: bool,

    /// Every tracked node, sorted lexicographically by path
    pub nodes: Vec<AggregationNode>,
}

impl Snapshot {
    /// Look up a node by path.
    pub fn node(&self, path: &str) -> Option<&AggregationNode> {
        self.nodes
            .binary_search_by(|n| n.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.nodes[i])
    }
}
