//! Storage tier enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage class assigned to an object.
///
/// The set is closed: a tier string outside it is a data error, not
/// something to bucket under "other".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageTier {
    Standard,
    StandardIa,
    ReducedRedundancy,
    Glacier,
    OnezoneIa,
    IntelligentTiering,
    DeepArchive,
    GlacierIr,
    Outposts,
    Snow,
    ExpressOnezone,
}

impl StorageTier {
    /// Every known tier, in declaration order.
    pub const ALL: [StorageTier; 11] = [
        StorageTier::Standard,
        StorageTier::StandardIa,
        StorageTier::ReducedRedundancy,
        StorageTier::Glacier,
        StorageTier::OnezoneIa,
        StorageTier::IntelligentTiering,
        StorageTier::DeepArchive,
        StorageTier::GlacierIr,
        StorageTier::Outposts,
        StorageTier::Snow,
        StorageTier::ExpressOnezone,
    ];

    /// The wire name used by the S3 API.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Standard => "STANDARD",
            StorageTier::StandardIa => "STANDARD_IA",
            StorageTier::ReducedRedundancy => "REDUCED_REDUNDANCY",
            StorageTier::Glacier => "GLACIER",
            StorageTier::OnezoneIa => "ONEZONE_IA",
            StorageTier::IntelligentTiering => "INTELLIGENT_TIERING",
            StorageTier::DeepArchive => "DEEP_ARCHIVE",
            StorageTier::GlacierIr => "GLACIER_IR",
            StorageTier::Outposts => "OUTPOSTS",
            StorageTier::Snow => "SNOW",
            StorageTier::ExpressOnezone => "EXPRESS_ONEZONE",
        }
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageTier::ALL
            .iter()
            .copied()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
