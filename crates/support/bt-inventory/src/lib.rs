//! S3 Inventory ingestion for bucket-tally.
//!
//! Reads an inventory `manifest.json` and its CSV data files (optionally
//! gzip-compressed) from the local filesystem and feeds each live object to
//! an entry sink, as an alternative to listing the bucket.

pub mod decode;
pub mod lister;
pub mod manifest;

pub use decode::decode_key;
pub use lister::{InventoryConfig, InventoryLister};
pub use manifest::{ColumnMap, InventoryManifest, ManifestFile};
