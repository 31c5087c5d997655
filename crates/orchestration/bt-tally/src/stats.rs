//! Statistics for tally runs.

use bt_traits::ListingStats;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during a tally run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyStats {
    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Entries accepted by the aggregator
    pub entries_observed: u64,

    /// Bytes across accepted entries
    pub bytes_observed: u64,

    /// Snapshots delivered to the output, including the final one
    pub snapshots_emitted: u64,

    /// Nodes in the final summary
    pub nodes: usize,

    /// Counters reported by the lister
    pub listing: ListingStats,
}

impl TallyStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the run as complete with the current time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Duration of the run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Throughput in entries per second.
    pub fn entries_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if secs > 0.0 {
                self.entries_observed as f64 / secs
            } else {
                0.0
            }
        })
    }
}

/// Live counters of a running tally, readable from other tasks.
#[derive(Debug, Default)]
pub struct TallyProgress {
    entries: AtomicU64,
    bytes: AtomicU64,
    snapshots: AtomicU64,
}

impl TallyProgress {
    pub(crate) fn record_entry(&self, size: u64) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub(crate) fn record_snapshot(&self) {
        self.snapshots.fetch_add(1, Ordering::Relaxed);
    }

    /// Entries aggregated so far.
    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }

    /// Bytes aggregated so far.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Snapshots emitted so far.
    pub fn snapshots(&self) -> u64 {
        self.snapshots.load(Ordering::Relaxed)
    }
}
