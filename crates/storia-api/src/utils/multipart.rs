//! Multipart form parsing for upload creation.

use axum::extract::Multipart;
use storia_core::models::{ContentKind, Visibility};
use storia_core::AppError;
use uuid::Uuid;

use crate::services::upload::types::{CreateUploadRequest, UploadFilePayload};

/// Parsed upload creation form.
pub struct UploadForm {
    pub request: CreateUploadRequest,
    pub content_files: Vec<UploadFilePayload>,
    pub thumbnail: Option<UploadFilePayload>,
}

/// Extract the upload creation form from multipart. Field names follow the
/// client contract: `userId`, `contentType`, `visibility`, `title`,
/// `description`, repeated `contentFiles` (or a single `contentFile`), and
/// an optional `thumbnailFile`. Per-file sizes are checked here so an
/// oversized file is rejected before any blob is staged.
pub async fn extract_upload_form(
    mut multipart: Multipart,
    max_file_size: usize,
) -> Result<UploadForm, AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut content_kind: Option<ContentKind> = None;
    let mut visibility: Option<Visibility> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut content_files: Vec<UploadFilePayload> = Vec::new();
    let mut thumbnail: Option<UploadFilePayload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match name.as_str() {
            "userId" | "user_id" => {
                let text = read_text(field, "userId").await?;
                let parsed = Uuid::parse_str(text.trim()).map_err(|_| {
                    AppError::InvalidInput("userId must be a valid UUID".to_string())
                })?;
                user_id = Some(parsed);
            }
            "contentType" | "content_type" => {
                let text = read_text(field, "contentType").await?;
                content_kind = Some(ContentKind::try_parse(text.trim()).ok_or_else(|| {
                    AppError::InvalidInput(format!("Unsupported content type: {}", text.trim()))
                })?);
            }
            "visibility" => {
                let text = read_text(field, "visibility").await?;
                visibility = Some(Visibility::try_parse(text.trim()).ok_or_else(|| {
                    AppError::InvalidInput(format!("Unsupported visibility: {}", text.trim()))
                })?);
            }
            "title" => {
                title = Some(read_text(field, "title").await?);
            }
            "description" => {
                let text = read_text(field, "description").await?;
                if !text.trim().is_empty() {
                    description = Some(text);
                }
            }
            "contentFiles" | "contentFile" => {
                content_files.push(read_file(field, max_file_size).await?);
            }
            "thumbnailFile" | "thumbnail" => {
                thumbnail = Some(read_file(field, max_file_size).await?);
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    let request = CreateUploadRequest {
        user_id: user_id
            .ok_or_else(|| AppError::InvalidInput("userId is required".to_string()))?,
        content_kind: content_kind
            .ok_or_else(|| AppError::InvalidInput("contentType is required".to_string()))?,
        visibility: visibility.unwrap_or(Visibility::Public),
        title: title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("title is required".to_string()))?,
        description,
    };

    Ok(UploadForm {
        request,
        content_files,
        thumbnail,
    })
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read field {}: {}", name, e)))
}

async fn read_file(
    field: axum::extract::multipart::Field<'_>,
    max_file_size: usize,
) -> Result<UploadFilePayload, AppError> {
    let filename = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "upload".to_string());
    let content_type = field.content_type().map(|s| s.to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?
        .to_vec();

    if data.len() > max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File {} exceeds maximum allowed size of {} MB",
            filename,
            max_file_size / 1024 / 1024
        )));
    }

    Ok(UploadFilePayload {
        filename,
        content_type,
        data,
    })
}
