//! Blob storage for uploaded program audio.
//!
//! Handlers talk to a [`BlobStore`] trait object so the same upload pipeline
//! runs against a local directory in development and S3 in production.

pub mod error;
pub mod local;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;

pub use error::StorageError;
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Name the blob is stored under (also kept in `audio_entries.file_name`).
    pub file_name: String,
    /// Public URL clients play and download from.
    pub url: String,
}

/// A place audio blobs live, addressed by file name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `file_name`, replacing any existing blob.
    async fn put(
        &self,
        file_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError>;

    /// Read a blob back in full.
    async fn get(&self, file_name: &str) -> Result<Bytes, StorageError>;

    /// Remove a blob.
    async fn delete(&self, file_name: &str) -> Result<(), StorageError>;

    /// Public URL for a stored file name.
    fn url_for(&self, file_name: &str) -> String;

    /// Recover the file name from a URL this store handed out, if it is one.
    fn file_name_for_url(&self, url: &str) -> Option<String>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Strip `base/` off `url` and return the remaining file name, if it is a
/// plain file name.
pub(crate) fn file_name_under(base: &str, url: &str) -> Option<String> {
    let rest = url.strip_prefix(base)?.strip_prefix('/')?;
    krushi_core::program::sanitize_served_file_name(rest)
        .ok()
        .map(str::to_string)
}
