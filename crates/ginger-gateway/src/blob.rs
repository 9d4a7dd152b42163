//! Blob storage service

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait BlobGateway: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket. A bucket already owned by the caller is success.
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Upload, overwriting any existing object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
}
