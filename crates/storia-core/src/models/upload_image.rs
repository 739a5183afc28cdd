use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{ProcessingStatus, StoryStatus};

/// One image belonging to an all-images upload, with its own OCR lifecycle.
///
/// `order_index` is unique and contiguous within the parent upload and
/// preserves submission order. `story_id` is assigned later when a story is
/// built from the finished upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadImage {
    pub id: Uuid,
    pub upload_id: Uuid,
    pub storage_path: String,
    pub mime_type: String,
    pub order_index: i32,
    pub file_size: Option<i64>,
    pub status: ProcessingStatus,
    pub progress: i32,
    pub story_id: Option<Uuid>,
    pub public_url: Option<String>,
    pub extracted_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new upload image row.
#[derive(Debug, Clone)]
pub struct NewUploadImage {
    pub storage_path: String,
    pub mime_type: String,
    pub order_index: i32,
    pub file_size: Option<i64>,
    pub status: ProcessingStatus,
    pub progress: i32,
    pub public_url: Option<String>,
}

/// Partial update applied to one image row. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UploadImagePatch {
    pub status: Option<ProcessingStatus>,
    pub progress: Option<i32>,
    pub extracted_text: Option<String>,
    pub public_url: Option<String>,
    pub story_id: Option<Uuid>,
}

/// Per-image view in API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub id: Uuid,
    pub upload_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<Uuid>,
    pub status: ProcessingStatus,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    pub storage_path: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl From<UploadImage> for UploadImageResponse {
    fn from(image: UploadImage) -> Self {
        Self {
            id: image.id,
            upload_id: image.upload_id,
            story_id: image.story_id,
            status: image.status,
            progress: image.progress,
            public_url: image.public_url,
            storage_path: image.storage_path,
            order: image.order_index,
            extracted_text: image.extracted_text,
        }
    }
}

/// The canonical polling shape: aggregate state plus the ordered per-image
/// breakdown a client renders a progress bar from.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrProgressResponse {
    /// Aggregate processing status of the upload.
    pub status: ProcessingStatus,
    pub story_status: StoryStatus,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    pub images: Vec<UploadImageResponse>,
}
