//! Namespace listing strategy trait.

use async_trait::async_trait;
use bt_error::{BtError, Result};
use bt_types::Entry;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Downstream end of the entry stream.
///
/// Any number of workers may hold a clone; the aggregation stage owns the
/// single receiver.
pub type EntrySink = mpsc::Sender<Entry>;

/// Receiving end of the entry stream.
pub type EntryStream = mpsc::Receiver<Entry>;

/// Create a bounded entry channel.
pub fn entry_channel(capacity: usize) -> (EntrySink, EntryStream) {
    mpsc::channel(capacity.max(1))
}

/// Forward one entry downstream, mapping a closed receiver to a pipeline error.
pub async fn forward(sink: &EntrySink, entry: Entry) -> Result<()> {
    sink.send(entry)
        .await
        .map_err(|_| BtError::Pipeline("entry stream receiver dropped".to_string()))
}

/// Counters for one listing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStats {
    /// Listing tasks executed (one per page request)
    pub tasks: u64,

    /// Pages received
    pub pages: u64,

    /// Entries forwarded downstream
    pub entries: u64,

    /// Bytes across forwarded entries
    pub bytes: u64,

    /// Sub-prefixes discovered (one new task each)
    pub prefixes: u64,

    /// Entries skipped by source-level filters (inventory delete markers, prefix filter)
    pub skipped: u64,
}

/// A strategy that streams every entry under a root prefix into a sink.
///
/// Implementations: concurrent recursive descent, sequential cursor loop and
/// inventory ingestion. The sink is consumed so that it closes when the
/// listing finishes.
#[async_trait]
pub trait NamespaceLister: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// List every entry under `prefix`, forwarding each to `sink` as it is found.
    ///
    /// Entries sent before an error stay sent.
    async fn list(&self, prefix: &str, sink: EntrySink) -> Result<ListingStats>;
}
