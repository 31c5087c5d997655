//! Core types for bucket-tally.
//!
//! This crate provides the data model shared by the listers and the
//! aggregation engine:
//! - [`Entry`] - One stored object flowing from a lister to the aggregator
//! - [`ObjectSummary`] - An object as reported by a single listing page
//! - [`StorageTier`] - Closed enumeration of storage classes
//! - [`AggregationNode`] / [`Snapshot`] - The per-path usage summary

pub mod entry;
pub mod summary;
pub mod tier;

pub use entry::*;
pub use summary::*;
pub use tier::*;
