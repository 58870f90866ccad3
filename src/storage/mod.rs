pub mod s3_gateway;

use async_trait::async_trait;
use axum::body::Bytes;
use serde::Serialize;

use crate::error::Result;

pub use s3_gateway::S3Gateway;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
}

/// Object content with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub size: u64,
    pub content_type: Option<String>,
}

/// Object storage operations on named buckets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileGateway: Send + Sync {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<UploadResult>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;
}
