//! Error types for bucket-tally.
//!
//! This crate provides:
//! - [`BtError`] - Top-level error enum for listing and aggregation runs
//! - Domain-specific errors ([`ListingError`], [`EntryError`], [`InventoryError`])
//!
//! Every error is terminal for the run that produced it. Retries happen below
//! this layer (inside the page source) and never surface here except as the
//! final [`ListingError::Exhausted`].

use thiserror::Error;

/// Top-level error type for bucket-tally.
#[derive(Error, Debug)]
pub enum BtError {
    /// Remote listing failed
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// An observed entry was rejected by the aggregation engine
    #[error("Entry error: {0}")]
    Entry(#[from] EntryError),

    /// Inventory manifest or data file could not be ingested
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline wiring errors (closed channels, closed aggregator, panicked workers)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Listing-related errors.
#[derive(Error, Debug)]
pub enum ListingError {
    /// A single list request failed
    ///
    /// `code` and `status` carry the service error code and HTTP status when
    /// the remote returned a response at all.
    #[error("List request for prefix '{prefix}' failed: {message}")]
    Request {
        prefix: String,
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },

    /// All retry attempts for a page were used up
    #[error("List request for prefix '{prefix}' failed after {attempts} attempts: {message}")]
    Exhausted {
        prefix: String,
        attempts: u32,
        message: String,
    },

    /// The remote returned an object without a key or size
    #[error("Malformed object in listing of '{prefix}': {reason}")]
    MalformedObject { prefix: String, reason: String },
}

impl ListingError {
    /// The prefix whose listing failed.
    pub fn prefix(&self) -> &str {
        match self {
            Self::Request { prefix, .. }
            | Self::Exhausted { prefix, .. }
            | Self::MalformedObject { prefix, .. } => prefix,
        }
    }
}

/// Errors raised when validating an observed entry.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EntryError {
    /// Storage tier outside the known enumeration
    #[error("Unknown storage tier '{tier}' for key '{key}'")]
    UnknownTier { tier: String, key: String },

    /// Required field missing or empty
    #[error("Malformed entry: {0}")]
    Malformed(String),
}

/// Inventory ingestion errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Manifest missing or not valid JSON
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// I/O error while reading a manifest or data file
    #[error("I/O error: {0}")]
    Io(String),

    /// Data file could not be decompressed
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// CSV row could not be parsed
    #[error("CSV error: {0}")]
    Csv(String),

    /// Manifest schema lacks a required column or uses an unsupported format
    #[error("Schema error: {0}")]
    Schema(String),
}

/// Result type alias using BtError.
pub type Result<T> = std::result::Result<T, BtError>;
