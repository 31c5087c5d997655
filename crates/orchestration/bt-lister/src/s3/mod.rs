//! S3 client and page source.
//!
//! - Client configuration with LocalStack support
//! - One-page listing through either list API version

mod client;
mod source;

pub use client::{DEFAULT_TIMEOUT_SECS, S3Config, StaticCredentials, create_s3_client};
pub use source::{ListApi, S3PageSource};
