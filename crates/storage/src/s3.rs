//! Blob store backed by an S3 bucket.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use krushi_core::program::sanitize_served_file_name;

use crate::{file_name_under, BlobStore, StorageError, StoredBlob};

/// Key prefix every audio object lives under.
pub const AUDIO_PREFIX: &str = "audio/";

/// Stores each blob as `s3://{bucket}/audio/{file_name}`.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>, public_base_url: &str) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from the standard AWS environment (credentials chain,
    /// `AWS_REGION`, `AWS_ENDPOINT_URL`).
    ///
    /// Without `public_base_url` objects are addressed at the bucket's
    /// virtual-hosted URL.
    pub async fn from_env(bucket: &str, public_base_url: Option<&str>) -> Self {
        let config = aws_config::load_from_env().await;
        let client = Client::new(&config);
        let base = public_base_url.map(str::to_string).unwrap_or_else(|| {
            let prefix = AUDIO_PREFIX.trim_end_matches('/');
            format!("https://{bucket}.s3.amazonaws.com/{prefix}")
        });
        Self::new(client, bucket, &base)
    }

    fn key_for(&self, file_name: &str) -> Result<String, StorageError> {
        let name = sanitize_served_file_name(file_name)
            .map_err(|_| StorageError::InvalidName(file_name.to_string()))?;
        Ok(format!("{AUDIO_PREFIX}{name}"))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        file_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        let key = self.key_for(file_name)?;
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(bucket = %self.bucket, key = %key, bytes = size, "Object uploaded");

        Ok(StoredBlob {
            file_name: file_name.to_string(),
            url: self.url_for(file_name),
        })
    }

    async fn get(&self, file_name: &str) -> Result<Bytes, StorageError> {
        let key = self.key_for(file_name)?;

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    return Err(StorageError::NotFound(file_name.to_string()));
                }
                return Err(StorageError::Backend(DisplayErrorContext(&service).to_string()));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(data.into_bytes())
    }

    /// S3 deletes are idempotent, so a missing object is not reported.
    async fn delete(&self, file_name: &str) -> Result<(), StorageError> {
        let key = self.key_for(file_name)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.public_base_url)
    }

    fn file_name_for_url(&self, url: &str) -> Option<String> {
        file_name_under(&self.public_base_url, url)
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
