use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::{ArtifactStore, validate_address};

/// In-process artifact store.
///
/// Returns deterministic `https://{host}/s3/{bucket}/{key}` URLs, which makes
/// it suitable for local development and for tests that assert on artifact
/// addresses. Uploads can be forced to fail with [`MemoryArtifactStore::fail_uploads`].
pub struct MemoryArtifactStore {
    host: String,
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryArtifactStore {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            objects: Mutex::new(BTreeMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent upload fail (or succeed again with `false`).
    pub fn fail_uploads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fetch a stored object.
    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn upload(&self, bucket: &str, key: &str, data: &[u8]) -> Result<String, StorageError> {
        validate_address(bucket, key)?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!(
                "upload of {bucket}/{key} rejected"
            )));
        }

        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((bucket.to_string(), key.to_string()), data.to_vec());

        Ok(format!("https://{}/s3/{bucket}/{key}", self.host))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        validate_address(bucket, key)?;
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(bucket.to_string(), key.to_string()))
            .is_some())
    }
}
