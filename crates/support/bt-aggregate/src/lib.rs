//! Incremental path aggregation for bucket-tally.
//!
//! The [`PathAggregator`] folds a stream of [`Entry`](bt_types::Entry)
//! observations into per-path, per-tier usage totals. Paths are the bucket
//! root plus up to `depth` ancestor directories of each key. The summary is
//! kept sorted by path so that every snapshot lists nodes in stable
//! lexicographic order.
//!
//! Copying the whole summary on every observation is too expensive for
//! buckets with millions of keys, so snapshots are throttled to one every
//! `output_factor` observations, plus a guaranteed final one on
//! [`flush`](PathAggregator::flush).
//!
//! # Example
//!
//! ```
//! use bt_aggregate::{AggregateConfig, PathAggregator};
//! use bt_types::{Entry, StorageTier};
//!
//! let config = AggregateConfig::new().with_depth(1).with_output_factor(100);
//! let mut aggregator = PathAggregator::new(config).unwrap();
//!
//! aggregator
//!     .observe(Entry::new("bucket", "logs/app.log", 42, "STANDARD"))
//!     .unwrap();
//!
//! let snapshot = aggregator.flush().unwrap();
//! assert_eq!(snapshot.nodes.len(), 2);
//! assert_eq!(snapshot.nodes[1].path, "bucket/logs");
//! assert_eq!(snapshot.nodes[1].tier(StorageTier::Standard).total_size, 42);
//! ```

pub mod aggregator;
pub mod config;
pub mod path;

pub use aggregator::{AggregatorState, PathAggregator};
pub use config::{AggregateConfig, DEFAULT_DELIMITER, DEFAULT_OUTPUT_FACTOR};
pub use path::derive_paths;
