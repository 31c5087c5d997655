//! Namespace listing for bucket-tally.
//!
//! This crate turns a paginated, delimiter-aware object listing into a
//! stream of [`Entry`](bt_types::Entry) values:
//!
//! - [`PageSource`](bt_traits::PageSource) implementations: [`S3PageSource`]
//!   and the in-memory [`MemoryPageSource`]
//! - [`RetryingPageSource`], retrying transient page failures with backoff
//! - [`WorkQueue`], a bounded FIFO queue whose handlers may enqueue more work
//! - [`ConcurrentLister`], recursive descent fanning out one task per
//!   sub-prefix, and the flat [`SequentialLister`] baseline

pub mod config;
pub mod memory;
pub mod queue;
pub mod retry;
pub mod s3;
pub mod stats;
pub mod walk;

pub use config::{DEFAULT_PAGE_SIZE, ListerConfig};
pub use memory::MemoryPageSource;
pub use queue::{DEFAULT_CONCURRENCY, Drained, QueueStats, TaskHandler, WorkQueue};
pub use retry::{
    ErrorClassification, RetryConfig, RetryingPageSource, classify_error, classify_listing_error,
    classify_request, with_retry,
};
pub use s3::{
    DEFAULT_TIMEOUT_SECS, ListApi, S3Config, S3PageSource, StaticCredentials, create_s3_client,
};
pub use stats::RunCounters;
pub use walk::{ConcurrentLister, ListingTask, SequentialLister, pages};
