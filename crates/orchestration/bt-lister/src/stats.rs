//! Per-run listing counters.

use bt_traits::ListingStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated concurrently by the workers of one run.
#[derive(Debug, Default)]
pub struct RunCounters {
    tasks: AtomicU64,
    pages: AtomicU64,
    entries: AtomicU64,
    bytes: AtomicU64,
    prefixes: AtomicU64,
}

impl RunCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one started task.
    pub fn record_task(&self) {
        self.tasks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one received page.
    pub fn record_page(&self, sub_prefixes: usize) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.prefixes
            .fetch_add(sub_prefixes as u64, Ordering::Relaxed);
    }

    /// Record one forwarded entry.
    pub fn record_entry(&self, size: u64) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    /// Copy the counters into a [`ListingStats`].
    pub fn snapshot(&self) -> ListingStats {
        ListingStats {
            tasks: self.tasks.load(Ordering::Relaxed),
            pages: self.pages.load(Ordering::Relaxed),
            entries: self.entries.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            prefixes: self.prefixes.load(Ordering::Relaxed),
            skipped: 0,
        }
    }
}
