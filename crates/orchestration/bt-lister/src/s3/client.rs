//! Building the S3 client used for listing.
//!
//! A tally only reads one bucket's key space, so the settings here cover
//! addressing (region, endpoint), authentication (provider chain, profile or
//! a static key pair) and the deadline of a single list attempt. Retries sit
//! above the client in [`RetryingPageSource`](crate::RetryingPageSource).

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use bt_error::{BtError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Default deadline for one list attempt, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// An access key pair used instead of the default provider chain.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Where the tallied bucket lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket to list
    pub bucket: String,

    /// Region; the provider chain decides when unset
    pub region: Option<String>,

    /// S3-compatible endpoint such as LocalStack; implies path-style addressing
    pub endpoint: Option<String>,

    /// Static key pair, overriding the provider chain
    pub credentials: Option<StaticCredentials>,

    /// Named profile from the shared AWS config files
    pub profile: Option<String>,

    /// Deadline for a single list attempt, in seconds
    pub timeout_secs: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: None,
            endpoint: None,
            credentials: None,
            profile: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl S3Config {
    /// Settings for listing `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Authenticate with a fixed key pair.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some(StaticCredentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        });
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Reject settings that could never list anything.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(BtError::Config("bucket name must not be empty".to_string()));
        }
        if self.bucket.contains('/') {
            return Err(BtError::Config(format!(
                "bucket name '{}' must not contain '/'; pass key prefixes separately",
                self.bucket
            )));
        }
        if self.timeout_secs == 0 {
            return Err(BtError::Config(
                "request timeout must be at least one second".to_string(),
            ));
        }
        if let Some(credentials) = &self.credentials {
            if credentials.access_key_id.is_empty() || credentials.secret_access_key.is_empty() {
                return Err(BtError::Config(
                    "static credentials need both an access key id and a secret".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Custom endpoints rarely support virtual-hosted addressing.
    fn path_style(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Create the S3 client for a listing run.
pub async fn create_s3_client(config: &S3Config) -> Result<Client> {
    config.validate()?;

    let shared = load_shared_config(config).await;
    let client_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(config.path_style())
        .build();

    debug!(
        bucket = %config.bucket,
        region = ?shared.region(),
        endpoint = ?config.endpoint,
        path_style = config.path_style(),
        static_credentials = config.credentials.is_some(),
        "Created S3 client"
    );

    Ok(Client::from_conf(client_config))
}

async fn load_shared_config(config: &S3Config) -> SdkConfig {
    let timeouts = TimeoutConfig::builder()
        .operation_attempt_timeout(Duration::from_secs(config.timeout_secs))
        .build();
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeouts);

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(credentials) = &config.credentials {
        loader = loader.credentials_provider(Credentials::new(
            &credentials.access_key_id,
            &credentials.secret_access_key,
            None,
            None,
            "bt-tally-static",
        ));
    }

    loader.load().await
}
