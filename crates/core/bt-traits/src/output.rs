//! Snapshot output trait.

use async_trait::async_trait;
use bt_error::Result;
use bt_types::Snapshot;

/// Trait for publishing aggregation snapshots.
///
/// Implementations handle delivery to the final destination, whether that's
/// stdout for piping into other tools or an in-memory collector in tests.
#[async_trait]
pub trait SnapshotOutput: Send + Sync {
    /// Publish one snapshot.
    async fn emit(&self, snapshot: &Snapshot) -> Result<()>;

    /// Flush any buffered output.
    ///
    /// Called once after the final snapshot has been emitted.
    async fn flush(&self) -> Result<()>;
}
