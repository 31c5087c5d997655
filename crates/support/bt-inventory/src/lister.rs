//! Inventory-backed namespace listing.
//!
//! Replays a local copy of an S3 Inventory report as an entry stream, so a
//! bucket can be tallied without issuing a single list request.

use async_compression::tokio::bufread::GzipDecoder;
use async_trait::async_trait;
use bt_error::{InventoryError, Result};
use bt_traits::{EntrySink, ListingStats, NamespaceLister, forward};
use bt_types::{Entry, StorageTier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::decode::decode_key;
use crate::manifest::{ColumnMap, InventoryManifest};

/// Configuration for inventory ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Path to `manifest.json`
    pub manifest: PathBuf,

    /// Directory holding the data files; defaults to the manifest's directory
    pub data_dir: Option<PathBuf>,
}

impl InventoryConfig {
    /// Create a configuration for a manifest path.
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            data_dir: None,
        }
    }

    /// Look for data files in `data_dir`.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    fn base_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => self
                .manifest
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

/// Lists a namespace from an inventory report on the local filesystem.
pub struct InventoryLister {
    config: InventoryConfig,
}

impl InventoryLister {
    /// Create an inventory lister.
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }

    /// Resolve a manifest data-file key to a local path.
    ///
    /// Tries the full key, then `data/<file name>`, then `<file name>`, all
    /// relative to the base directory.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let base = self.config.base_dir();
        let file_name = Path::new(key)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(key));

        let candidates = [
            base.join(key),
            base.join("data").join(&file_name),
            base.join(&file_name),
        ];

        candidates
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| {
                InventoryError::Io(format!(
                    "data file '{key}' not found under '{}'",
                    base.display()
                ))
                .into()
            })
    }
}

#[async_trait]
impl NamespaceLister for InventoryLister {
    fn name(&self) -> &'static str {
        "inventory"
    }

    async fn list(&self, prefix: &str, sink: EntrySink) -> Result<ListingStats> {
        let manifest = InventoryManifest::load(&self.config.manifest).await?;
        let columns = manifest.columns()?;

        info!(
            manifest = %self.config.manifest.display(),
            bucket = %manifest.source_bucket,
            files = manifest.files.len(),
            prefix = %prefix,
            "Starting inventory ingestion"
        );

        let mut stats = ListingStats::default();
        for file in &manifest.files {
            let path = self.resolve(&file.key)?;
            stats.tasks += 1;
            stats.pages += 1;
            read_data_file(&path, &columns, prefix, &sink, &mut stats).await?;
        }

        info!(
            files = stats.pages,
            entries = stats.entries,
            skipped = stats.skipped,
            "Inventory ingestion finished"
        );
        Ok(stats)
    }
}

/// Data-file lines parsed per CSV reader.
const BATCH_ROWS: usize = 4096;

/// Stream the rows of one data file into the sink.
async fn read_data_file(
    path: &Path,
    columns: &ColumnMap,
    prefix: &str,
    sink: &EntrySink,
    stats: &mut ListingStats,
) -> Result<()> {
    debug!(path = %path.display(), "Reading inventory data file");

    let file = tokio::fs::File::open(path).await.map_err(|e| {
        InventoryError::Io(format!("failed to open '{}': {e}", path.display()))
    })?;

    let gzipped = path.extension().is_some_and(|ext| ext == "gz");
    let reader: Pin<Box<dyn AsyncBufRead + Send>> = if gzipped {
        let decoder = GzipDecoder::new(BufReader::with_capacity(8192, file));
        Box::pin(BufReader::with_capacity(8192, decoder))
    } else {
        Box::pin(BufReader::with_capacity(8192, file))
    };

    let mut lines = reader.lines();
    let mut batch = RowBatch::new();
    let mut line_number = 0u64;

    loop {
        let line = lines.next_line().await.map_err(|e| {
            let message = format!("'{}' line {}: {e}", path.display(), line_number + 1);
            if gzipped {
                InventoryError::Decompression(message)
            } else {
                InventoryError::Io(message)
            }
        })?;

        let done = line.is_none();
        if let Some(line) = line {
            line_number += 1;
            if !line.trim().is_empty() {
                batch.push(&line, line_number);
            }
        }

        if batch.is_full() || (done && !batch.is_empty()) {
            for row in batch.parse(columns) {
                let row = row.map_err(|(line, e)| {
                    InventoryError::Csv(format!("'{}' line {line}: {e}", path.display()))
                })?;
                match row {
                    Row::DeleteMarker => stats.skipped += 1,
                    Row::Entry(entry) if entry.key.starts_with(prefix) => {
                        stats.entries += 1;
                        stats.bytes = stats.bytes.saturating_add(entry.size);
                        forward(sink, entry).await?;
                    }
                    Row::Entry(_) => stats.skipped += 1,
                }
            }
        }

        if done {
            break;
        }
    }

    if line_number == 0 {
        warn!(path = %path.display(), "Inventory data file is empty");
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Row {
    Entry(Entry),
    DeleteMarker,
}

/// Buffered data-file lines, parsed with one CSV reader per batch and a
/// single reused record.
struct RowBatch {
    buffer: Vec<u8>,
    line_numbers: Vec<u64>,
    record: csv::StringRecord,
}

impl RowBatch {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            line_numbers: Vec::with_capacity(BATCH_ROWS),
            record: csv::StringRecord::new(),
        }
    }

    fn push(&mut self, line: &str, line_number: u64) {
        self.buffer.extend_from_slice(line.as_bytes());
        self.buffer.push(b'\n');
        self.line_numbers.push(line_number);
    }

    fn is_full(&self) -> bool {
        self.line_numbers.len() >= BATCH_ROWS
    }

    fn is_empty(&self) -> bool {
        self.line_numbers.is_empty()
    }

    /// Parse every buffered line and empty the batch.
    ///
    /// Stops after the first bad row, which is reported with its line number.
    fn parse(&mut self, columns: &ColumnMap) -> Vec<std::result::Result<Row, (u64, String)>> {
        let mut rows = Vec::with_capacity(self.line_numbers.len());
        {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(self.buffer.as_slice());

            for &line_number in &self.line_numbers {
                let row = match reader.read_record(&mut self.record) {
                    Ok(true) => parse_record(&self.record, columns),
                    Ok(false) => Err("empty row".to_string()),
                    Err(e) => Err(e.to_string()),
                };
                let failed = row.is_err();
                rows.push(row.map_err(|e| (line_number, e)));
                if failed {
                    break;
                }
            }
        }
        self.buffer.clear();
        self.line_numbers.clear();
        rows
    }
}

/// Map one headerless CSV record onto the column layout.
fn parse_record(
    record: &csv::StringRecord,
    columns: &ColumnMap,
) -> std::result::Result<Row, String> {
    if record.len() < columns.width {
        return Err(format!(
            "expected {} columns, found {}",
            columns.width,
            record.len()
        ));
    }

    let field = |index: usize| record.get(index).unwrap_or_default().trim();

    if let Some(index) = columns.is_delete_marker {
        if field(index).eq_ignore_ascii_case("true") {
            return Ok(Row::DeleteMarker);
        }
    }

    let bucket = field(columns.bucket);
    let key = decode_key(field(columns.key));
    let size = field(columns.size)
        .parse::<u64>()
        .map_err(|e| format!("invalid size '{}' for key '{key}': {e}", field(columns.size)))?;
    let tier = columns
        .storage_class
        .map(field)
        .filter(|tier| !tier.is_empty())
        .unwrap_or(StorageTier::Standard.as_str());

    Ok(Row::Entry(Entry::new(bucket, key, size, tier)))
}
