//! Store traits the upload orchestrator is written against.
//!
//! The Postgres repositories implement these; tests substitute in-memory
//! mocks. Keeping the service decoupled from sqlx makes the aggregation
//! logic deterministic to test.

use async_trait::async_trait;
use storia_core::models::{
    NewUpload, NewUploadImage, ProcessingUpdate, Upload, UploadImage, UploadImagePatch,
};
use storia_core::AppError;
use uuid::Uuid;

/// Durable store for upload aggregate records.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Insert the upload and its image rows in one transaction. Returns the
    /// created upload and its images in submission order.
    async fn create_with_images(
        &self,
        upload: NewUpload,
        images: Vec<NewUploadImage>,
    ) -> Result<(Upload, Vec<UploadImage>), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Upload>, AppError>;

    /// Write a recomputed aggregate state. `None` fields in the update leave
    /// the stored value untouched. FAILED is sticky: once the stored
    /// processing status is FAILED, statuses and progress are not changed by
    /// this call (text and error fields still update), so concurrent
    /// recomputations can never revert a failed upload.
    async fn update_processing(&self, id: Uuid, update: ProcessingUpdate)
        -> Result<(), AppError>;

    /// Mark the upload ready for story creation: READY, progress 100, error
    /// cleared.
    async fn mark_completed(&self, id: Uuid) -> Result<(), AppError>;

    /// Mark the upload failed with a reason.
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<(), AppError>;
}

/// Durable store for per-image OCR state.
#[async_trait]
pub trait UploadImageStore: Send + Sync {
    /// Images of one upload, ordered by `order_index`.
    async fn list_by_upload(&self, upload_id: Uuid) -> Result<Vec<UploadImage>, AppError>;

    /// Images assigned to a story, ordered by `order_index`.
    async fn list_by_story(&self, story_id: Uuid) -> Result<Vec<UploadImage>, AppError>;

    /// Apply a partial update to one image. Returns the updated row, or
    /// `None` if the image does not exist.
    async fn update_image(
        &self,
        id: Uuid,
        patch: UploadImagePatch,
    ) -> Result<Option<UploadImage>, AppError>;

    /// Assign every image of an upload to a story. Used when a story is
    /// created from a finished upload.
    async fn bulk_assign_story(&self, upload_id: Uuid, story_id: Uuid) -> Result<(), AppError>;
}
