use storia_core::models::{ContentKind, Visibility};
use uuid::Uuid;

/// One file received in the upload form.
#[derive(Debug, Clone)]
pub struct UploadFilePayload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Non-file fields of an upload creation request.
#[derive(Debug, Clone)]
pub struct CreateUploadRequest {
    pub user_id: Uuid,
    pub content_kind: ContentKind,
    pub visibility: Visibility,
    pub title: String,
    pub description: Option<String>,
}

/// A content file that has been written to blob storage and classified.
#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub payload: UploadFilePayload,
    pub storage_key: String,
    pub public_url: Option<String>,
    pub is_image: bool,
    pub order_index: i32,
}
