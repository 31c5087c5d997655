//! Core traits for bucket-tally.
//!
//! This crate defines the seams between the pipeline stages:
//! - [`PageSource`] - One page of a delimiter-grouped listing (S3, in-memory)
//! - [`NamespaceLister`] - A strategy that streams every entry under a prefix
//!   (concurrent descent, sequential cursor loop, inventory ingestion)
//! - [`SnapshotOutput`] - Destination for aggregation snapshots

pub mod lister;
pub mod output;
pub mod source;

pub use lister::*;
pub use output::*;
pub use source::*;
