//! Configuration for a tally run.

use bt_aggregate::AggregateConfig;
use serde::{Deserialize, Serialize};

/// Default capacity of the entry channel between listing and aggregation.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for one listing-to-summary run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Root prefix to tally (empty for the whole bucket)
    pub prefix: String,

    /// Entries buffered between the listing workers and the aggregator
    pub channel_capacity: usize,

    /// Aggregation settings
    pub aggregate: AggregateConfig,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            aggregate: AggregateConfig::default(),
        }
    }
}

impl TallyConfig {
    /// Create a new tally configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the entry channel capacity.
    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Set the aggregation settings.
    pub fn with_aggregate(mut self, aggregate: AggregateConfig) -> Self {
        self.aggregate = aggregate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_config_defaults() {
        let config = TallyConfig::new();
        assert!(config.prefix.is_empty());
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.aggregate, AggregateConfig::default());
    }

    #[test]
    fn test_tally_config_builder() {
        let config = TallyConfig::new()
            .with_prefix("logs/")
            .with_channel_capacity(8)
            .with_aggregate(AggregateConfig::new().with_depth(3));

        assert_eq!(config.prefix, "logs/");
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.aggregate.depth, 3);
    }
}
