use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{ArtifactStore, validate_address};

/// Filesystem-backed artifact store for single-node deployments.
///
/// Objects are stored at `{base_path}/{bucket}/{key}` and are expected to be
/// served by a static file server rooted at `base_path`, reachable under
/// `public_url`.
pub struct FilesystemArtifactStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemArtifactStore {
    /// Create a new filesystem artifact store.
    pub async fn new(
        base_path: PathBuf,
        public_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.base_path.join(bucket).join(key)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifactStore {
    async fn upload(&self, bucket: &str, key: &str, data: &[u8]) -> Result<String, StorageError> {
        validate_address(bucket, key)?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let object_path = self.object_path(bucket, key);
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(format!("{}/{bucket}/{key}", self.public_url))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        validate_address(bucket, key)?;
        match fs::remove_file(self.object_path(bucket, key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
