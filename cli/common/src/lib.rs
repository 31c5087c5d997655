//! Shared utilities for bucket-tally CLI binaries.

pub mod args;
pub mod format;
pub mod logging;

pub use args::{LogLevel, parse_positive_u64, parse_positive_usize};
pub use format::{format_bytes, format_duration, format_number};
pub use logging::init_logging;
