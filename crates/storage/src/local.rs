//! Blob store backed by a directory on the local filesystem.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use krushi_core::program::sanitize_served_file_name;

use crate::{file_name_under, BlobStore, StorageError, StoredBlob};

/// Stores each blob as `{root}/{file_name}`.
///
/// URLs point at `{public_base_url}/{file_name}`, which the API serves from
/// the same directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a file name to its path, rejecting names that could leave
    /// the root directory.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let name = sanitize_served_file_name(file_name)
            .map_err(|_| StorageError::InvalidName(file_name.to_string()))?;
        Ok(self.root.join(name))
    }

    /// File names currently in the root directory, sorted.
    ///
    /// A missing directory is reported as empty.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn not_found_or_io(file_name: &str, err: std::io::Error) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(file_name.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        file_name: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        let path = self.path_for(file_name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Blob written");

        Ok(StoredBlob {
            file_name: file_name.to_string(),
            url: self.url_for(file_name),
        })
    }

    async fn get(&self, file_name: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(file_name)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(file_name, e))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, file_name: &str) -> Result<(), StorageError> {
        let path = self.path_for(file_name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(file_name, e))
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.public_base_url)
    }

    fn file_name_for_url(&self, url: &str) -> Option<String> {
        file_name_under(&self.public_base_url, url)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
