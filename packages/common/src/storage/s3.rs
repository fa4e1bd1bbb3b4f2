use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::traits::{ArtifactStore, validate_address};

/// S3-compatible artifact store (MinIO, Ceph RGW, AWS).
///
/// Uses path-style addressing so that objects resolve to
/// `{endpoint}/{bucket}/{key}`.
pub struct S3ArtifactStore {
    region: Region,
    credentials: Credentials,
    public_url: String,
}

impl S3ArtifactStore {
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        public_url: Option<&str>,
    ) -> Result<Self, StorageError> {
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let public_url = public_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| endpoint.clone());

        Ok(Self {
            region: Region::Custom {
                region: region.to_string(),
                endpoint,
            },
            credentials,
            public_url,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StorageError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(bucket.with_path_style())
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn upload(&self, bucket: &str, key: &str, data: &[u8]) -> Result<String, StorageError> {
        validate_address(bucket, key)?;
        let content_type = mime_guess::from_path(key).first_or_octet_stream();
        let response = self
            .bucket(bucket)?
            .put_object_with_content_type(key, data, content_type.essence_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "PUT {bucket}/{key} returned HTTP {status}"
            )));
        }

        debug!(bucket, key, size = data.len(), "Uploaded artifact");
        Ok(format!("{}/{bucket}/{key}", self.public_url))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        validate_address(bucket, key)?;
        let response = self
            .bucket(bucket)?
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Backend(format!(
                "DELETE {bucket}/{key} returned HTTP {status}"
            ))),
        }
    }
}
