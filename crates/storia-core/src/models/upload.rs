use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{ContentKind, ProcessingStatus, StoryStatus, Visibility};
use super::upload_image::{UploadImage, UploadImageResponse};

/// The aggregate record for one ingestion request and its derived
/// processing state.
///
/// Invariant: `processing_status == Completed` iff
/// `status ∈ {Ready, Published}` iff `progress == 100`, and
/// `processing_status == Failed` implies `status == Failed`. The upload
/// orchestrator is the only writer that moves these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_kind: ContentKind,
    pub visibility: Visibility,
    pub title: String,
    pub description: Option<String>,
    /// Storage key of the primary content object.
    pub content_file_id: String,
    pub thumbnail_file_id: Option<String>,
    pub status: StoryStatus,
    pub processing_status: ProcessingStatus,
    pub progress: i32,
    pub extracted_text: Option<String>,
    pub ocr_text: Option<String>,
    pub error_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new upload row. The repository assigns the id
/// and timestamps.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub user_id: Uuid,
    pub content_kind: ContentKind,
    pub visibility: Visibility,
    pub title: String,
    pub description: Option<String>,
    pub content_file_id: String,
    pub thumbnail_file_id: Option<String>,
    pub status: StoryStatus,
    pub processing_status: ProcessingStatus,
    pub progress: i32,
    pub extracted_text: Option<String>,
    pub ocr_text: Option<String>,
}

/// Aggregate state recomputation written by the progress refresh.
///
/// `progress` and `combined_text` are optional: `None` leaves the stored
/// value untouched, which keeps the failed branch from clobbering the last
/// known progress. `combined_text` is written to both `extracted_text` and
/// `ocr_text` when present.
#[derive(Debug, Clone)]
pub struct ProcessingUpdate {
    pub processing_status: ProcessingStatus,
    pub story_status: StoryStatus,
    pub progress: Option<i32>,
    pub combined_text: Option<String>,
    pub error_reason: Option<String>,
}

/// Fully materialized upload view returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_type: ContentKind,
    pub visibility: Visibility,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub status: StoryStatus,
    pub processing_status: ProcessingStatus,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    pub images: Vec<UploadImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadResponse {
    pub fn from_upload(
        upload: Upload,
        content_url: Option<String>,
        thumbnail_url: Option<String>,
        images: Vec<UploadImage>,
    ) -> Self {
        Self {
            id: upload.id,
            user_id: upload.user_id,
            content_type: upload.content_kind,
            visibility: upload.visibility,
            title: upload.title,
            description: upload.description,
            content_url,
            thumbnail_url,
            status: upload.status,
            processing_status: upload.processing_status,
            progress: upload.progress,
            extracted_text: upload.extracted_text,
            ocr_text: upload.ocr_text,
            error_reason: upload.error_reason,
            images: images.into_iter().map(UploadImageResponse::from).collect(),
            created_at: upload.created_at,
            updated_at: upload.updated_at,
        }
    }
}
