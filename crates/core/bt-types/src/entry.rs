//! Entry types produced by listers.

use serde::{Deserialize, Serialize};

/// An object as returned by one listing page, before the bucket is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    /// The object key (full path within the bucket)
    pub key: String,

    /// Size of the object in bytes
    pub size: u64,

    /// Storage class as reported by the remote, unvalidated
    pub tier: String,
}

impl ObjectSummary {
    /// Create a new object summary.
    pub fn new(key: impl Into<String>, size: u64, tier: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size,
            tier: tier.into(),
        }
    }
}

/// One storage object flowing downstream to the aggregation engine.
///
/// Entries are moved, never shared: whichever stage holds an entry owns it,
/// and forwarding it transfers ownership to the next stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Bucket (namespace) the object lives in
    pub bucket: String,

    /// The object key
    pub key: String,

    /// Size of the object in bytes
    pub size: u64,

    /// Storage class string, validated by the aggregator
    pub tier: String,
}

impl Entry {
    /// Create a new entry.
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        size: u64,
        tier: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            size,
            tier: tier.into(),
        }
    }

    /// Attach a bucket identity to an object from a listing page.
    pub fn from_summary(bucket: impl Into<String>, summary: ObjectSummary) -> Self {
        Self {
            bucket: bucket.into(),
            key: summary.key,
            size: summary.size,
            tier: summary.tier,
        }
    }
}
