//! S3 blob adapter

use super::errors::classify;
use crate::blob::BlobGateway;
use crate::error::Result;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use tracing::info;

const SERVICE: &str = "blob";

/// Region that rejects an explicit location constraint
const DEFAULT_LOCATION: &str = "us-east-1";

pub struct S3Blob {
    client: Client,
    region: String,
}

impl S3Blob {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

#[async_trait]
impl BlobGateway for S3Blob {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().map(|s| s.is_not_found()).unwrap_or(false) {
                    return Ok(false);
                }
                match classify(SERVICE, "head_bucket", bucket, e) {
                    err if err.is_not_found() => Ok(false),
                    err => Err(err),
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let configuration = (self.region != DEFAULT_LOCATION).then(|| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build()
        });

        match self
            .client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(configuration)
            .send()
            .await
        {
            Ok(_) => {
                info!(bucket, "Bucket created");
                Ok(())
            }
            Err(e) => {
                if e.as_service_error()
                    .map(|s| s.is_bucket_already_owned_by_you())
                    .unwrap_or(false)
                {
                    info!(bucket, "Bucket already owned by caller");
                    return Ok(());
                }
                Err(classify(SERVICE, "create_bucket", bucket, e))
            }
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| classify(SERVICE, "put_object", key, e))?;
        Ok(())
    }
}
