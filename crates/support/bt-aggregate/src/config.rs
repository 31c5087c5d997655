//! Configuration for the aggregation engine.

use bt_error::{BtError, Result};
use serde::{Deserialize, Serialize};

/// Default path delimiter.
pub const DEFAULT_DELIMITER: &str = "/";

/// Default number of observations between throttled snapshots.
pub const DEFAULT_OUTPUT_FACTOR: u64 = 100;

/// Configuration for a [`PathAggregator`](crate::PathAggregator) run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Delimiter splitting keys into directory segments
    pub delimiter: String,

    /// Number of ancestor directories tracked below the bucket root (0 = bucket only)
    pub depth: usize,

    /// Emit a snapshot every `output_factor` observations
    pub output_factor: u64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            depth: 0,
            output_factor: DEFAULT_OUTPUT_FACTOR,
        }
    }
}

impl AggregateConfig {
    /// Create a new aggregation configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the tracked depth.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the snapshot throttling factor.
    pub fn with_output_factor(mut self, output_factor: u64) -> Self {
        self.output_factor = output_factor;
        self
    }

    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(BtError::Config("delimiter must not be empty".to_string()));
        }
        if self.output_factor == 0 {
            return Err(BtError::Config("output factor must be at least 1".to_string()));
        }
        Ok(())
    }
}
