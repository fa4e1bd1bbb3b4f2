use async_trait::async_trait;

use super::error::StorageError;

/// Object storage that hosts uploaded package artifacts.
///
/// Implementations must be cheap to share behind an `Arc`; the registry holds
/// one instance for its whole lifetime.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `data` under `bucket`/`key` and return the URL it is served from.
    ///
    /// Uploading to an existing key replaces the previous object.
    async fn upload(&self, bucket: &str, key: &str, data: &[u8]) -> Result<String, StorageError>;

    /// Remove the object at `bucket`/`key`.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;
}

/// Reject bucket names and keys that cannot be mapped onto an object address.
pub(crate) fn validate_address(bucket: &str, key: &str) -> Result<(), StorageError> {
    if bucket.is_empty() || bucket.contains('/') {
        return Err(StorageError::InvalidKey(format!("bad bucket name '{bucket}'")));
    }
    if key.is_empty() || key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!("bad key '{key}'")));
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(StorageError::InvalidKey(format!("bad key '{key}'")));
    }
    Ok(())
}
