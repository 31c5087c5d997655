//! bt-tally CLI
//!
//! Storage usage tally for S3 buckets.

use bt_cli_common::{format_bytes, format_number, init_logging};
use clap::Parser;

mod args;
mod progress;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr; stdout carries only snapshots
    init_logging(args.log_level)?;

    let summary = run::execute(args).await?;
    let stats = summary.stats;

    eprintln!();
    eprintln!("Tally completed:");
    eprintln!("  Objects:    {}", format_number(stats.entries_observed));
    eprintln!("  Bytes:      {}", format_bytes(stats.bytes_observed));
    eprintln!("  Nodes:      {}", format_number(stats.nodes as u64));
    eprintln!("  Snapshots:  {}", stats.snapshots_emitted);
    eprintln!(
        "  Listing:    {} pages, {} prefixes, {} skipped",
        format_number(stats.listing.pages),
        format_number(stats.listing.prefixes),
        format_number(stats.listing.skipped)
    );
    if let Some(retries) = summary.retries {
        eprintln!("  Retries:    {}", format_number(retries));
    }

    if let Some(duration) = stats.duration() {
        let elapsed = duration.to_std().unwrap_or_default();
        eprintln!("  Duration:   {}", bt_cli_common::format_duration(elapsed));

        if let Some(rate) = stats.entries_per_second() {
            eprintln!("  Throughput: {} objects/sec", format_number(rate as u64));
        }
    }

    Ok(())
}
