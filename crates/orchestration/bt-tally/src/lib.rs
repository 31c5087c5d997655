//! bt-tally - storage usage tallying pipeline.
//!
//! Connects a [`NamespaceLister`](bt_traits::NamespaceLister) to a
//! [`PathAggregator`](bt_aggregate::PathAggregator) through a bounded entry
//! channel and publishes the resulting snapshots:
//!
//! - [`Tally`] runs one listing-to-summary pass
//! - [`output`] holds the stdout and in-memory snapshot outputs
//! - [`TallyStats`] and [`TallyProgress`] report what happened
//!
//! # Example
//!
//! ```ignore
//! use bt_lister::{ConcurrentLister, ListerConfig, S3Config, S3PageSource, create_s3_client};
//! use bt_tally::{Tally, TallyConfig, output::StdoutOutput};
//!
//! let client = create_s3_client(&S3Config::new("my-bucket")).await?;
//! let source = Arc::new(S3PageSource::new(client, "my-bucket"));
//! let lister = ConcurrentLister::new(source, ListerConfig::new());
//!
//! let tally = Tally::new(lister, StdoutOutput::jsonl(), TallyConfig::new());
//! let stats = tally.run().await?;
//! eprintln!("Tallied {} objects", stats.entries_observed);
//! ```

pub mod config;
pub mod output;
pub mod stats;
pub mod tally;

pub use config::{DEFAULT_CHANNEL_CAPACITY, TallyConfig};
pub use output::{CollectingOutput, OutputFormat, SnapshotOutput, StdoutOutput};
pub use stats::{TallyProgress, TallyStats};
pub use tally::Tally;
