//! Stdout output implementation for summary snapshots.

use async_trait::async_trait;
use bt_error::{BtError, Result};
use bt_traits::SnapshotOutput;
use bt_types::Snapshot;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Output format for stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON Lines format - one snapshot per line (default)
    #[default]
    Jsonl,

    /// Pretty-printed JSON
    Json,
}

/// Writes snapshots to stdout.
///
/// JSONL puts each snapshot on one line, so a consumer can follow progress
/// with `tail -f` or keep only the last line with `tail -n 1`.
pub struct StdoutOutput {
    format: OutputFormat,
    final_only: bool,
}

impl StdoutOutput {
    /// Create a new StdoutOutput with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            final_only: false,
        }
    }

    /// Create a new StdoutOutput with JSONL format (default).
    pub fn jsonl() -> Self {
        Self::new(OutputFormat::Jsonl)
    }

    /// Create a new StdoutOutput with pretty-printed JSON format.
    pub fn json() -> Self {
        Self::new(OutputFormat::Json)
    }

    /// Print only the final snapshot.
    pub fn with_final_only(mut self, final_only: bool) -> Self {
        self.final_only = final_only;
        self
    }

    fn render(&self, snapshot: &Snapshot) -> Result<Option<String>> {
        if self.final_only && !snapshot.is_final {
            return Ok(None);
        }

        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(snapshot),
            OutputFormat::Jsonl => serde_json::to_string(snapshot),
        }
        .map_err(|e| BtError::Pipeline(format!("JSON serialization failed: {e}")))?;

        Ok(Some(rendered))
    }
}

impl Default for StdoutOutput {
    fn default() -> Self {
        Self::jsonl()
    }
}

#[async_trait]
impl SnapshotOutput for StdoutOutput {
    async fn emit(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(rendered) = self.render(snapshot)? {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{rendered}")
                .map_err(|e| BtError::Pipeline(format!("Failed to write to stdout: {e}")))?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        std::io::stdout()
            .flush()
            .map_err(|e| BtError::Pipeline(format!("Failed to flush stdout: {e}")))?;
        Ok(())
    }
}
