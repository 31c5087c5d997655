//! Inventory manifest parsing.

use bt_error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One data file listed by a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Object key of the data file in the destination bucket
    pub key: String,

    /// Compressed size in bytes
    #[serde(default)]
    pub size: u64,

    #[serde(rename = "MD5checksum", default)]
    pub md5_checksum: Option<String>,
}

/// An S3 Inventory `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryManifest {
    /// Bucket the inventory describes
    pub source_bucket: String,

    #[serde(default)]
    pub destination_bucket: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// Data file format; only `CSV` is supported
    pub file_format: String,

    /// Comma-separated column names of the data files
    pub file_schema: String,

    /// Data files making up the report
    pub files: Vec<ManifestFile>,
}

impl InventoryManifest {
    /// Read and parse a manifest from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            InventoryError::Io(format!("failed to read manifest '{}': {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parse manifest JSON.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(content)
            .map_err(|e| InventoryError::Manifest(e.to_string()))?;

        if !manifest.file_format.eq_ignore_ascii_case("csv") {
            return Err(InventoryError::Schema(format!(
                "unsupported inventory format '{}', only CSV is supported",
                manifest.file_format
            ))
            .into());
        }

        Ok(manifest)
    }

    /// Column positions described by `fileSchema`.
    pub fn columns(&self) -> Result<ColumnMap> {
        ColumnMap::from_schema(&self.file_schema)
    }
}

/// Positions of the columns the ingestion needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub bucket: usize,
    pub key: usize,
    pub size: usize,
    pub storage_class: Option<usize>,
    pub is_delete_marker: Option<usize>,
    /// Number of columns per row
    pub width: usize,
}

impl ColumnMap {
    /// Build from a schema string such as `"Bucket, Key, Size, StorageClass"`.
    pub fn from_schema(schema: &str) -> Result<Self> {
        let names: Vec<&str> = schema.split(',').map(str::trim).collect();
        let find = |name: &str| names.iter().position(|n| n.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                InventoryError::Schema(format!("fileSchema '{schema}' has no '{name}' column"))
            })
        };

        Ok(Self {
            bucket: require("Bucket")?,
            key: require("Key")?,
            size: require("Size")?,
            storage_class: find("StorageClass"),
            is_delete_marker: find("IsDeleteMarker"),
            width: names.len(),
        })
    }
}
