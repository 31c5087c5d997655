//! Snapshot output implementations.
//!
//! - [`StdoutOutput`] - JSON or JSONL on stdout
//! - [`CollectingOutput`] - keeps snapshots in memory

mod memory;
mod stdout;

pub use bt_traits::SnapshotOutput;
pub use memory::CollectingOutput;
pub use stdout::{OutputFormat, StdoutOutput};
