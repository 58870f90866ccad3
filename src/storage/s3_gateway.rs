use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use axum::body::Bytes;
use tracing::{debug, error};

use super::{FileGateway, StoredObject, UploadResult};
use crate::config::StorageSettings;
use crate::error::{AppError, Result};

/// S3-compatible object storage client using path-style addressing and
/// static credentials.
#[derive(Clone)]
pub struct S3Gateway {
    client: Client,
}

impl S3Gateway {
    pub fn new(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "static",
        );

        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&settings.endpoint)
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(config),
        }
    }
}

fn storage_error<E>(operation: &str, bucket: &str, key: &str, err: E) -> AppError
where
    E: std::error::Error,
{
    let message = DisplayErrorContext(&err).to_string();
    error!(operation, bucket, key, error = %message, "s3 operation failed");
    AppError::Storage(format!("{} {}/{}: {}", operation, bucket, key, message))
}

#[async_trait]
impl FileGateway for S3Gateway {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<UploadResult> {
        let size = body.len() as u64;

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(size as i64)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| storage_error("put_object", bucket, key, e))?;

        debug!(bucket, key, size, "object uploaded");

        Ok(UploadResult {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size,
            etag: output.e_tag().map(str::to_string),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("delete_object", bucket, key, e))?;

        debug!(bucket, key, "object deleted");
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("get_object", bucket, key, e))?;

        let content_type = output.content_type().map(str::to_string);
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error("get_object", bucket, key, e))?
            .into_bytes();

        Ok(StoredObject {
            size: body.len() as u64,
            body,
            content_type,
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    Ok(false)
                } else {
                    Err(storage_error("head_bucket", bucket, "", err))
                }
            }
        }
    }
}
