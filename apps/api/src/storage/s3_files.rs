use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::debug;

use super::{FileStore, StoreError};

/// File store over one S3 (or MinIO) bucket. Record paths are used as object
/// keys with any leading `/` removed.
#[derive(Clone)]
pub struct S3FileStore {
    client: S3Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn object_key(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn read_blob(&self, path: &str) -> Result<Bytes, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_key(path))
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    StoreError::NotFound(path.to_string())
                } else {
                    StoreError::Backend(format!("S3 get_object failed: {err}"))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Backend(format!("S3 body read failed: {e}")))?;
        Ok(body.into_bytes())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_key(path))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("S3 delete_object failed: {e}")))?;
        debug!("Deleted s3://{}/{}", self.bucket, object_key(path));
        Ok(())
    }
}
