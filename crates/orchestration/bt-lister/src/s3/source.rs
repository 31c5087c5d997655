//! One-page listing against S3.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::Object;
use bt_error::{ListingError, Result};
use bt_traits::{ListingPage, PageRequest, PageSource};
use bt_types::{ObjectSummary, StorageTier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Which list API a source calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListApi {
    /// `ListObjectsV2`, continuation-token cursors
    #[default]
    V2,
    /// `ListObjects`, marker cursors
    V1,
}

impl fmt::Display for ListApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2 => write!(f, "v2"),
            Self::V1 => write!(f, "v1"),
        }
    }
}

impl FromStr for ListApi {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v2" | "2" => Ok(Self::V2),
            "v1" | "1" => Ok(Self::V1),
            other => Err(format!("unknown list API '{other}', expected v1 or v2")),
        }
    }
}

/// A [`PageSource`] listing one S3 bucket.
#[derive(Debug, Clone)]
pub struct S3PageSource {
    client: Client,
    bucket: String,
    api: ListApi,
}

impl S3PageSource {
    /// Create a source using `ListObjectsV2`.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            api: ListApi::V2,
        }
    }

    /// Select the list API.
    pub fn with_api(mut self, api: ListApi) -> Self {
        self.api = api;
        self
    }

    /// The list API in use.
    pub fn api(&self) -> ListApi {
        self.api
    }

    async fn list_v2(&self, request: &PageRequest) -> Result<ListingPage> {
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&request.prefix)
            .max_keys(max_keys(request.page_size));

        if let Some(delimiter) = &request.delimiter {
            req = req.delimiter(delimiter);
        }
        if let Some(token) = &request.cursor {
            req = req.continuation_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| request_error(request, e))?;

        let objects = summarize_all(&request.prefix, resp.contents.unwrap_or_default())?;
        let sub_prefixes = resp
            .common_prefixes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|cp| cp.prefix)
            .collect();

        let next_cursor = if resp.is_truncated == Some(true) {
            resp.next_continuation_token
        } else {
            None
        };

        Ok(ListingPage {
            next_cursor,
            objects,
            sub_prefixes,
        })
    }

    async fn list_v1(&self, request: &PageRequest) -> Result<ListingPage> {
        let mut req = self
            .client
            .list_objects()
            .bucket(&self.bucket)
            .prefix(&request.prefix)
            .max_keys(max_keys(request.page_size));

        if let Some(delimiter) = &request.delimiter {
            req = req.delimiter(delimiter);
        }
        if let Some(marker) = &request.cursor {
            req = req.marker(marker);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| request_error(request, e))?;

        let objects = summarize_all(&request.prefix, resp.contents.unwrap_or_default())?;
        let sub_prefixes: Vec<String> = resp
            .common_prefixes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|cp| cp.prefix)
            .collect();

        let next_cursor = v1_next_marker(
            resp.is_truncated == Some(true),
            resp.next_marker,
            &objects,
            &sub_prefixes,
        );

        Ok(ListingPage {
            next_cursor,
            objects,
            sub_prefixes,
        })
    }
}

#[async_trait]
impl PageSource for S3PageSource {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_page(&self, request: &PageRequest) -> Result<ListingPage> {
        trace!(
            bucket = %self.bucket,
            prefix = %request.prefix,
            cursor = ?request.cursor,
            api = %self.api,
            "Requesting page"
        );

        match self.api {
            ListApi::V2 => self.list_v2(request).await,
            ListApi::V1 => self.list_v1(request).await,
        }
    }
}

fn max_keys(page_size: usize) -> i32 {
    i32::try_from(page_size.max(1)).unwrap_or(i32::MAX)
}

fn request_error<E>(request: &PageRequest, error: SdkError<E, HttpResponse>) -> ListingError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    ListingError::Request {
        prefix: request.prefix.clone(),
        code: error.code().map(str::to_string),
        status: error.raw_response().map(|response| response.status().as_u16()),
        message: DisplayErrorContext(&error).to_string(),
    }
}

/// Marker for the next v1 page.
///
/// NextMarker is only returned when a delimiter is set; otherwise the
/// greater of the last key and the last rolled-up prefix is the marker.
fn v1_next_marker(
    truncated: bool,
    next_marker: Option<String>,
    objects: &[ObjectSummary],
    sub_prefixes: &[String],
) -> Option<String> {
    if !truncated {
        return None;
    }
    next_marker.or_else(|| {
        let last_key = objects.last().map(|o| o.key.clone());
        let last_prefix = sub_prefixes.last().cloned();
        last_key.max(last_prefix)
    })
}

fn summarize_all(prefix: &str, objects: Vec<Object>) -> Result<Vec<ObjectSummary>> {
    objects
        .into_iter()
        .map(|object| summarize(prefix, object).map_err(Into::into))
        .collect()
}

/// Convert one listed object, defaulting a missing storage class to STANDARD.
fn summarize(prefix: &str, object: Object) -> std::result::Result<ObjectSummary, ListingError> {
    let malformed = |reason: String| ListingError::MalformedObject {
        prefix: prefix.to_string(),
        reason,
    };

    let key = object
        .key
        .ok_or_else(|| malformed("object without a key".to_string()))?;
    let size = object
        .size
        .ok_or_else(|| malformed(format!("object '{key}' without a size")))?;
    let size = u64::try_from(size).map_err(|_| malformed(format!("object '{key}' has negative size {size}")))?;
    let tier = object
        .storage_class
        .map(|class| class.as_str().to_string())
        .unwrap_or_else(|| StorageTier::Standard.as_str().to_string());

    Ok(ObjectSummary::new(key, size, tier))
}
