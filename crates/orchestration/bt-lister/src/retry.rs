//! Retry logic for listing requests.
//!
//! Provides exponential backoff with jitter for transient listing errors and
//! a [`RetryingPageSource`] decorator that applies it to any [`PageSource`].

use async_trait::async_trait;
use bt_error::{BtError, ListingError, Result};
use bt_traits::{ListingPage, PageRequest, PageSource};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds.
    pub max_backoff_ms: u64,
    /// Whether to add jitter to backoff times.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts (clamped to at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the initial backoff in milliseconds.
    pub fn with_initial_backoff_ms(mut self, initial_backoff_ms: u64) -> Self {
        self.initial_backoff_ms = initial_backoff_ms;
        self
    }

    /// Set the maximum backoff in milliseconds.
    pub fn with_max_backoff_ms(mut self, max_backoff_ms: u64) -> Self {
        self.max_backoff_ms = max_backoff_ms;
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the backoff duration after a failed attempt (0-based).
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let base_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped_ms = base_ms.min(self.max_backoff_ms);

        let final_ms = if self.jitter {
            let jitter_range = capped_ms / 4; // 25% jitter
            let jitter = rand::rng().random_range(0..=jitter_range);
            capped_ms.saturating_add(jitter)
        } else {
            capped_ms
        };

        Duration::from_millis(final_ms)
    }
}

/// Error classification for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// The error is transient and can be retried.
    Retryable,
    /// The error is permanent and should not be retried.
    NonRetryable,
}

/// Service error codes that fail the same way on every attempt.
const PERMANENT_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidBucketName",
    "InvalidRequest",
    "InvalidToken",
    "NoSuchBucket",
    "PermanentRedirect",
    "SignatureDoesNotMatch",
];

/// Service error codes for throttling and server-side trouble.
const TRANSIENT_CODES: &[&str] = &[
    "InternalError",
    "RequestTimeout",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "SlowDown",
    "Throttling",
    "ThrottlingException",
    "TooManyRequests",
];

/// Classify a service error code, if it is one we know.
fn classify_code(code: &str) -> Option<ErrorClassification> {
    if PERMANENT_CODES.iter().any(|c| c.eq_ignore_ascii_case(code)) {
        Some(ErrorClassification::NonRetryable)
    } else if TRANSIENT_CODES.iter().any(|c| c.eq_ignore_ascii_case(code)) {
        Some(ErrorClassification::Retryable)
    } else {
        None
    }
}

/// Classify an HTTP status code.
///
/// 408, 429 and 5xx are transient; any other 3xx or 4xx is permanent.
fn classify_status(status: u16) -> ErrorClassification {
    match status {
        408 | 429 | 500..=599 => ErrorClassification::Retryable,
        300..=499 => ErrorClassification::NonRetryable,
        _ => ErrorClassification::Retryable,
    }
}

/// Classify a remote error message for retry purposes.
///
/// Used when the failure carries no structured code or status, for example
/// a dispatch failure. Permanent error names win over transient ones, and
/// status codes only count as standalone three-digit tokens so request ids
/// never influence the outcome.
///
/// Retryable errors:
/// - HTTP 5xx (server errors), 408 and 429
/// - SlowDown (throttling)
/// - TooManyRequests
/// - Network timeouts and dropped connections
///
/// Non-retryable errors:
/// - HTTP 4xx (client errors) except throttling
/// - AccessDenied
/// - NoSuchBucket
/// - InvalidRequest
pub fn classify_error(error: &str) -> ErrorClassification {
    let error_lower = error.to_lowercase();

    if PERMANENT_CODES
        .iter()
        .any(|code| error_lower.contains(&code.to_lowercase()))
    {
        return ErrorClassification::NonRetryable;
    }

    if TRANSIENT_CODES
        .iter()
        .any(|code| error_lower.contains(&code.to_lowercase()))
        || error_lower.contains("throttl")
        || error_lower.contains("service unavailable")
        || error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("dispatch failure")
        || error_lower.contains("connection reset")
        || error_lower.contains("connection refused")
    {
        return ErrorClassification::Retryable;
    }

    let status = error_lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() == 3)
        .find_map(|token| token.parse::<u16>().ok())
        .filter(|status| (100..=599).contains(status));

    match status {
        Some(status) => classify_status(status),
        // Unknown remote failures are treated as transient
        None => ErrorClassification::Retryable,
    }
}

/// Classify one failed request from its code, status and message.
///
/// A known service code decides first, then the HTTP status, then the
/// message text.
pub fn classify_request(
    code: Option<&str>,
    status: Option<u16>,
    message: &str,
) -> ErrorClassification {
    if let Some(classification) = code.and_then(classify_code) {
        return classification;
    }
    if let Some(status) = status {
        return classify_status(status);
    }
    classify_error(message)
}

/// Classify a pipeline error for retry purposes.
///
/// Only failed remote requests are candidates for a retry; malformed
/// responses and pipeline errors would fail the same way again.
pub fn classify_listing_error(error: &BtError) -> ErrorClassification {
    match error {
        BtError::Listing(ListingError::Request {
            code,
            status,
            message,
            ..
        }) => classify_request(code.as_deref(), *status, message),
        _ => ErrorClassification::NonRetryable,
    }
}

/// Execute an async operation with retry logic.
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `operation_name` - Name of the operation for logging
/// * `classify` - Decides whether an error is worth another attempt
/// * `operation` - The async operation to execute
///
/// # Returns
///
/// The result of the operation, or the last error if all attempts failed.
pub async fn with_retry<F, Fut, T, E, C>(
    config: &RetryConfig,
    operation_name: &str,
    classify: C,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
    C: Fn(&E) -> ErrorClassification,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if classify(&error) == ErrorClassification::NonRetryable {
            warn!(
                operation = operation_name,
                attempt = attempt,
                error = %error,
                "Non-retryable error"
            );
            return Err(error);
        }

        if attempt + 1 >= max_attempts {
            warn!(
                operation = operation_name,
                attempts = max_attempts,
                error = %error,
                "Retry budget exhausted"
            );
            return Err(error);
        }

        let backoff = config.backoff_duration(attempt);
        warn!(
            operation = operation_name,
            attempt = attempt,
            error = %error,
            backoff_ms = backoff.as_millis(),
            "Retryable error, backing off"
        );
        sleep(backoff).await;
        attempt += 1;
    }
}

/// A [`PageSource`] decorator retrying transient failures of the inner source.
///
/// When the retry budget runs out the caller sees a single
/// [`ListingError::Exhausted`]; non-retryable errors pass through unchanged.
pub struct RetryingPageSource<S> {
    inner: S,
    config: RetryConfig,
    retries: AtomicU64,
}

impl<S: PageSource> RetryingPageSource<S> {
    /// Wrap a page source.
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            retries: AtomicU64::new(0),
        }
    }

    /// Number of retried attempts across all requests so far.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PageSource> PageSource for RetryingPageSource<S> {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    async fn list_page(&self, request: &PageRequest) -> Result<ListingPage> {
        let attempts = AtomicU32::new(0);

        let result = with_retry(&self.config, "list_page", classify_listing_error, || {
            if attempts.fetch_add(1, Ordering::Relaxed) > 0 {
                self.retries.fetch_add(1, Ordering::Relaxed);
            }
            self.inner.list_page(request)
        })
        .await;

        result.map_err(|error| {
            let attempts = attempts.load(Ordering::Relaxed);
            if classify_listing_error(&error) == ErrorClassification::Retryable {
                ListingError::Exhausted {
                    prefix: request.prefix.clone(),
                    attempts,
                    message: error.to_string(),
                }
                .into()
            } else {
                error
            }
        })
    }
}
