//! Blob staging and rollback.
//!
//! Every submitted file is written to blob storage before any database
//! record exists. The stager remembers what it wrote; if any later step of
//! the request fails, `rollback` issues one best-effort bulk delete.
//! Rollback failures are logged, never escalated, so they cannot mask the
//! original error.

use std::sync::Arc;

use storia_core::AppError;
use storia_storage::Storage;

/// Tracks blobs written during one upload request for potential rollback.
pub struct BlobStager {
    storage: Arc<dyn Storage>,
    staged_keys: Vec<String>,
}

impl BlobStager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            staged_keys: Vec::new(),
        }
    }

    /// Write one blob and record its key for rollback.
    pub async fn stage(
        &mut self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<(), AppError> {
        self.storage
            .upload(storage_key, content_type, data)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        self.staged_keys.push(storage_key.to_string());
        Ok(())
    }

    /// Resolve the public URL for a staged blob. Resolution failures fall
    /// back to a deterministically constructed URL and never fail the
    /// request.
    pub async fn resolve_public_url(&self, storage_key: &str) -> String {
        resolve_public_url(self.storage.as_ref(), storage_key).await
    }

    /// Best-effort delete of every blob staged in this request.
    pub async fn rollback(&self) {
        if self.staged_keys.is_empty() {
            return;
        }
        tracing::warn!(
            count = self.staged_keys.len(),
            "Rolling back staged blobs after failed upload request"
        );
        if let Err(e) = self.storage.delete_many(&self.staged_keys).await {
            tracing::warn!(
                error = %e,
                keys = ?self.staged_keys,
                "Failed to roll back staged blobs"
            );
        }
    }

    #[cfg(test)]
    pub fn staged_keys(&self) -> &[String] {
        &self.staged_keys
    }
}

/// Resolve a public URL with a deterministic fallback on failure.
pub async fn resolve_public_url(storage: &dyn Storage, storage_key: &str) -> String {
    match storage.public_url(storage_key).await {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(
                key = %storage_key,
                error = %e,
                "Public URL resolution failed, using fallback"
            );
            storage.fallback_url(storage_key)
        }
    }
}
