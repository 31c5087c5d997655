//! CLI argument definitions for bt-tally.

use bt_cli_common::{LogLevel, parse_positive_u64, parse_positive_usize};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Storage usage tally for S3 buckets.
///
/// Lists a bucket (or replays an S3 Inventory report) and prints a running
/// per-directory, per-storage-class summary to stdout, one snapshot every
/// `--output-factor` objects plus a final one.
///
/// ## Examples
///
/// Whole bucket, two directory levels deep:
///   bt-tally -b my-bucket --depth 2
///
/// Only the final summary, from an inventory report:
///   bt-tally --mode inventory --manifest ./inventory/manifest.json --final-only
///
/// Against LocalStack with the v1 list API:
///   bt-tally -b my-bucket --s3-endpoint http://localhost:4566 --list-api v1
#[derive(Parser, Debug)]
#[command(name = "bt-tally")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === S3 Configuration ===
    /// S3 bucket name (required unless --mode inventory)
    #[arg(short, long, env = "BT_S3_BUCKET")]
    pub bucket: Option<String>,

    /// Root prefix to tally
    #[arg(short, long, env = "BT_S3_PREFIX", default_value = "")]
    pub prefix: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "BT_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30", value_parser = parse_positive_u64)]
    pub timeout: u64,

    // === Listing Options ===
    /// Listing strategy
    #[arg(long, value_enum, default_value = "concurrent")]
    pub mode: Mode,

    /// List API version
    #[arg(long, value_enum, default_value = "v2")]
    pub list_api: ListApiArg,

    /// Maximum concurrent list requests (must be >= 1)
    #[arg(long, default_value = "15", value_parser = parse_positive_usize)]
    pub concurrency: usize,

    /// Keys requested per page (must be >= 1)
    #[arg(long, default_value = "1000", value_parser = parse_positive_usize)]
    pub page_size: usize,

    /// Total attempts per page request (must be >= 1)
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    // === Inventory Options ===
    /// Inventory manifest.json (required when --mode inventory)
    #[arg(long, env = "BT_INVENTORY_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Directory holding the inventory data files (default: next to the manifest)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    // === Aggregation Options ===
    /// Key delimiter
    #[arg(long, default_value = "/")]
    pub delimiter: String,

    /// Directory levels tracked below the bucket root
    #[arg(short, long, default_value = "0")]
    pub depth: usize,

    /// Objects between snapshots (must be >= 1)
    #[arg(long, default_value = "100", value_parser = parse_positive_u64)]
    pub output_factor: u64,

    /// Entries buffered between listing and aggregation (must be >= 1)
    #[arg(long, default_value = "1024", value_parser = parse_positive_usize)]
    pub channel_capacity: usize,

    // === Output Options ===
    /// Output format for snapshots
    #[arg(long, value_enum, default_value = "jsonl")]
    pub output_format: OutputFormatArg,

    /// Print only the final snapshot
    #[arg(long)]
    pub final_only: bool,

    /// Print a progress line to stderr periodically
    #[arg(long)]
    pub progress: bool,

    /// Seconds between progress lines (must be >= 1)
    #[arg(long, default_value = "5", value_parser = parse_positive_u64)]
    pub progress_interval: u64,

    // === Logging Options ===
    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Listing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Recursive descent with one task per sub-prefix
    Concurrent,
    /// Flat single-cursor listing
    Sequential,
    /// Replay a local S3 Inventory report
    Inventory,
}

/// List API argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListApiArg {
    /// ListObjectsV2
    V2,
    /// ListObjects (marker based)
    V1,
}

impl From<ListApiArg> for bt_lister::ListApi {
    fn from(arg: ListApiArg) -> Self {
        match arg {
            ListApiArg::V2 => bt_lister::ListApi::V2,
            ListApiArg::V1 => bt_lister::ListApi::V1,
        }
    }
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// JSON Lines (one snapshot per line)
    Jsonl,
    /// Pretty-printed JSON
    Json,
}

impl From<OutputFormatArg> for bt_tally::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Jsonl => bt_tally::OutputFormat::Jsonl,
            OutputFormatArg::Json => bt_tally::OutputFormat::Json,
        }
    }
}
