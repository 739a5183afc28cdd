//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use storia_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3-compatible, local filesystem) must implement this
/// trait. The upload orchestrator works with any backend without coupling to
/// implementation details.
///
/// **Key format:** keys are produced by [`crate::keys::build_object_key`]:
/// `{user_id}/{random_token}_{filename}`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a specific storage key. Returns the public URL for the
    /// uploaded object.
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Download an object by its storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by its storage key. Deleting a missing object is not
    /// an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Best-effort bulk delete used for staging rollback. Attempts every key
    /// and returns the first error encountered, if any.
    async fn delete_many(&self, storage_keys: &[String]) -> StorageResult<()> {
        let mut first_error = None;
        for key in storage_keys {
            if let Err(e) = self.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Bulk delete: failed to delete object");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Resolve the public URL for an object. May hit the backend; callers
    /// that must not block on URL resolution should fall back to
    /// [`Storage::fallback_url`] on error.
    async fn public_url(&self, storage_key: &str) -> StorageResult<String>;

    /// Deterministically constructed public URL. Never hits the backend and
    /// never fails.
    fn fallback_url(&self, storage_key: &str) -> String;

    /// Check if an object exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
