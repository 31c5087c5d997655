//! In-memory snapshot collection.

use async_trait::async_trait;
use bt_error::Result;
use bt_traits::SnapshotOutput;
use bt_types::Snapshot;
use parking_lot::Mutex;

/// Keeps every emitted snapshot, for embedding and tests.
#[derive(Debug, Default)]
pub struct CollectingOutput {
    snapshots: Mutex<Vec<Snapshot>>,
    flushes: Mutex<u32>,
}

impl CollectingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the snapshots received so far.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().clone()
    }

    /// The most recent snapshot.
    pub fn last(&self) -> Option<Snapshot> {
        self.snapshots.lock().last().cloned()
    }

    /// How many times the output was flushed.
    pub fn flushes(&self) -> u32 {
        *self.flushes.lock()
    }
}

#[async_trait]
impl SnapshotOutput for CollectingOutput {
    async fn emit(&self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.lock().push(snapshot.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        *self.flushes.lock() += 1;
        Ok(())
    }
}
