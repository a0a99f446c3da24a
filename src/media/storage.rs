//! Remote storage for processed images.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StorageError;

/// Folder for main images.
pub const PHOTO_FOLDER: &str = "photo-browser";

/// Folder for thumbnails.
pub const THUMBNAIL_FOLDER: &str = "photo-browser/thumbnails";

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Key used to delete the object later
    pub key: String,
    /// Public URL returned to clients
    pub url: String,
}

/// Object storage for uploaded images.
///
/// Implementations must be thread-safe; one instance serves every request.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Store `data` under a fresh key inside `folder`.
    async fn put(
        &self,
        folder: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredAsset, StorageError>;

    /// Remove the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Delete an asset without failing the caller.
///
/// Returns whether the delete succeeded; failures are logged.
pub async fn delete_best_effort(storage: &dyn AssetStorage, key: &str) -> bool {
    match storage.delete(key).await {
        Ok(()) => {
            debug!(key = %key, "Deleted asset");
            true
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to delete asset");
            false
        }
    }
}

/// Build a fresh object key for a JPEG inside `folder`.
pub fn asset_key(folder: &str) -> String {
    format!("{}/{}.jpg", folder.trim_end_matches('/'), Uuid::new_v4())
}

// =============================================================================
// S3
// =============================================================================

/// S3-backed asset storage (AWS or any S3-compatible service such as MinIO).
#[derive(Clone)]
pub struct S3AssetStorage {
    client: Client,
    bucket: String,
    base_url: String,
}

impl S3AssetStorage {
    /// `base_url` is the public prefix objects are served from; the object key
    /// is appended to it.
    pub fn new(client: Client, bucket: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl AssetStorage for S3AssetStorage {
    async fn put(
        &self,
        folder: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredAsset, StorageError> {
        let key = asset_key(folder);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("s3://{}/{}: {}", self.bucket, key, e)))?;

        let url = self.url_for(&key);
        Ok(StoredAsset { key, url })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete(format!("s3://{}/{}: {}", self.bucket, key, e)))?;
        Ok(())
    }
}

/// Public URL prefix for objects when none is configured.
///
/// Custom endpoints use path-style addressing, AWS uses virtual-hosted style.
pub fn default_base_url(endpoint: Option<&str>, bucket: &str, region: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    if endpoint_url.is_some() {
        builder = builder.force_path_style(true);
    }

    Client::from_conf(builder.build())
}
