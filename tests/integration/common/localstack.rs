//! LocalStack test context and utilities.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::types::StorageClass;
use bt_lister::{S3Config, create_s3_client};

/// LocalStack test context providing an S3 client.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub endpoint: String,
    pub region: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());
        let region = "us-east-1".to_string();

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.clone()))
            .endpoint_url(&endpoint)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Self {
            s3: S3Client::from_conf(s3_config),
            endpoint,
            region,
        }
    }

    /// Check if LocalStack is available and healthy.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// S3 client configured the way the CLI configures it.
    pub async fn tally_client(&self, bucket: &str) -> S3Client {
        let config = S3Config::new(bucket)
            .with_endpoint(&self.endpoint)
            .with_region(&self.region)
            .with_credentials("test", "test");
        create_s3_client(&config).await.unwrap()
    }

    /// Create an S3 bucket for testing if it does not exist.
    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// Upload an object of `size` zero bytes with a storage class.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        size: usize,
        storage_class: StorageClass,
    ) -> Result<(), aws_sdk_s3::Error> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(vec![0u8; size].into())
            .storage_class(storage_class)
            .send()
            .await?;
        Ok(())
    }

    /// Fill a bucket with a small two-level tree.
    ///
    /// Layout: `{a,b,c,d}/{x,y}/obj{0..3}`, 10 bytes each, `d/` in GLACIER.
    /// Returns the number of objects written.
    pub async fn seed_tree(&self, bucket: &str) -> Result<u64, aws_sdk_s3::Error> {
        self.create_bucket(bucket).await?;
        let mut written = 0;

        for top in ["a", "b", "c", "d"] {
            let class = if top == "d" {
                StorageClass::Glacier
            } else {
                StorageClass::Standard
            };
            for sub in ["x", "y"] {
                for i in 0..3 {
                    let key = format!("{top}/{sub}/obj{i}");
                    self.put_object(bucket, &key, 10, class.clone()).await?;
                    written += 1;
                }
            }
        }
        Ok(written)
    }
}
