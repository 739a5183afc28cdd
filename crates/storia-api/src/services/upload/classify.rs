//! Content classification and initial state derivation.
//!
//! Runs synchronously over the staged file set, before any record is
//! persisted. The rules, in order: reject mixed image/document sets; an
//! all-image set requires the OCR engine to be enabled and starts in
//! `OCR_IN_PROGRESS`; a single document is extracted inline and the upload
//! is born `READY`. Any rejection here happens before record persistence,
//! so it only requires blob rollback.

use storia_core::models::{ProcessingStatus, StoryStatus};
use storia_core::AppError;

use super::types::{PreparedFile, UploadFilePayload};

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic",
];

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "text", "pdf", "doc", "docx"];

const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Initial upload state derived from the submitted file set.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub status: StoryStatus,
    pub processing_status: ProcessingStatus,
    pub progress: i32,
    pub extracted_text: Option<String>,
    pub ocr_text: Option<String>,
}

/// Classify a file as an image by content-type prefix first, falling back
/// to the filename extension.
pub fn is_image_file(payload: &UploadFilePayload) -> bool {
    if let Some(content_type) = &payload.content_type {
        if content_type.to_lowercase().starts_with("image/") {
            return true;
        }
    }
    match file_extension(&payload.filename) {
        Some(extension) => IMAGE_EXTENSIONS.contains(&extension.as_str()),
        None => false,
    }
}

/// Classify a file as a supported document by content type or extension.
pub fn is_document_file(payload: &UploadFilePayload) -> bool {
    if let Some(content_type) = &payload.content_type {
        if DOCUMENT_CONTENT_TYPES.contains(&content_type.to_lowercase().as_str()) {
            return true;
        }
    }
    match file_extension(&payload.filename) {
        Some(extension) => DOCUMENT_EXTENSIONS.contains(&extension.as_str()),
        None => false,
    }
}

fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Decide the processing path and compute the upload's initial state.
pub fn derive_initial_state(
    prepared_files: &[PreparedFile],
    ocr_enabled: bool,
) -> Result<InitialState, AppError> {
    let image_count = prepared_files.iter().filter(|f| f.is_image).count();
    let non_image_count = prepared_files.len() - image_count;

    if image_count > 0 {
        if non_image_count > 0 {
            return Err(AppError::InvalidInput(
                "Mixing images and documents in one upload is not supported".to_string(),
            ));
        }
        if !ocr_enabled {
            return Err(AppError::OcrUnavailable(
                "OCR service is disabled. Enable OCR or upload a text document instead."
                    .to_string(),
            ));
        }
        return Ok(InitialState {
            status: StoryStatus::OcrInProgress,
            processing_status: ProcessingStatus::Processing,
            progress: 0,
            extracted_text: None,
            ocr_text: None,
        });
    }

    if prepared_files.len() > 1 {
        return Err(AppError::InvalidInput(
            "Only one document file per upload is supported".to_string(),
        ));
    }

    let primary = match prepared_files.first() {
        Some(file) => file,
        None => {
            return Err(AppError::InvalidInput(
                "No content files provided".to_string(),
            ))
        }
    };

    if !is_document_file(&primary.payload) {
        return Err(AppError::UnsupportedMediaType(
            "File format is not supported for text extraction".to_string(),
        ));
    }

    let extracted = storia_extract::extract_text(&primary.payload.data, &primary.payload.filename)
        .map_err(|e| {
            tracing::warn!(
                filename = %primary.payload.filename,
                error = %e,
                "Document text extraction failed"
            );
            AppError::ExtractionFailed(
                "Could not extract text from the uploaded file".to_string(),
            )
        })?;

    let cleaned = extracted
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::ExtractionFailed("File does not contain usable text content".to_string())
        })?;

    Ok(InitialState {
        status: StoryStatus::Ready,
        processing_status: ProcessingStatus::Completed,
        progress: 100,
        extracted_text: Some(cleaned.clone()),
        ocr_text: Some(cleaned),
    })
}
