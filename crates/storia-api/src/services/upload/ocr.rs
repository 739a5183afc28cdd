//! Per-image OCR processing and aggregate progress recomputation.
//!
//! Each job drives one image to a terminal state and then refreshes the
//! parent upload from the full current child snapshot. The refresh is
//! read-then-write and idempotent: re-running it with the same child states
//! produces the same parent state, so concurrent completions from sibling
//! jobs converge. Failure is sticky: one failed image pins the parent at
//! FAILED regardless of later sibling successes.

use std::sync::Arc;

use storia_core::models::{
    ProcessingStatus, ProcessingUpdate, StoryStatus, UploadImage, UploadImagePatch,
};
use storia_core::AppError;
use storia_db::{UploadImageStore, UploadStore};
use storia_ocr::{OcrEngine, OcrError, DEFAULT_OCR_PROMPT};
use storia_storage::Storage;
use uuid::Uuid;

/// Progress marker set when a job starts, distinguishing "dispatched" from
/// "not yet started" during polling.
const DISPATCH_PROGRESS: i32 = 5;

/// Collaborators the OCR worker pool needs to process one image.
#[derive(Clone)]
pub struct OcrWorkerContext {
    pub uploads: Arc<dyn UploadStore>,
    pub images: Arc<dyn UploadImageStore>,
    pub storage: Arc<dyn Storage>,
    pub engine: Arc<OcrEngine>,
}

/// Drive one image through its OCR lifecycle:
/// PROCESSING -> {COMPLETED, FAILED}, then refresh the parent aggregate.
///
/// An OCR failure is absorbed into persisted state (image FAILED, parent
/// FAILED) and never raised to the caller; only record-store failures
/// propagate.
#[tracing::instrument(skip(ctx, storage_path), fields(upload_id = %upload_id, image_id = %image_id))]
pub async fn process_image_ocr(
    ctx: &OcrWorkerContext,
    upload_id: Uuid,
    image_id: Uuid,
    storage_path: &str,
) -> Result<(), AppError> {
    ctx.images
        .update_image(
            image_id,
            UploadImagePatch {
                status: Some(ProcessingStatus::Processing),
                progress: Some(DISPATCH_PROGRESS),
                ..Default::default()
            },
        )
        .await?;

    match run_ocr(ctx, storage_path).await {
        Ok(text) => {
            let trimmed = text.trim().to_string();
            ctx.images
                .update_image(
                    image_id,
                    UploadImagePatch {
                        status: Some(ProcessingStatus::Completed),
                        progress: Some(100),
                        extracted_text: if trimmed.is_empty() {
                            None
                        } else {
                            Some(trimmed)
                        },
                        ..Default::default()
                    },
                )
                .await?;
        }
        Err(err) => {
            tracing::error!(
                upload_id = %upload_id,
                image_id = %image_id,
                error = %err,
                "OCR processing failed for image"
            );
            // No partial text is kept on failure
            ctx.images
                .update_image(
                    image_id,
                    UploadImagePatch {
                        status: Some(ProcessingStatus::Failed),
                        progress: Some(0),
                        ..Default::default()
                    },
                )
                .await?;
            ctx.uploads
                .update_processing(
                    upload_id,
                    ProcessingUpdate {
                        processing_status: ProcessingStatus::Failed,
                        story_status: StoryStatus::Failed,
                        progress: None,
                        combined_text: None,
                        error_reason: Some(err.to_string()),
                    },
                )
                .await?;
        }
    }

    refresh_upload_progress(ctx, upload_id).await
}

async fn run_ocr(ctx: &OcrWorkerContext, storage_path: &str) -> Result<String, AppError> {
    let image_bytes = ctx
        .storage
        .download(storage_path)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    ctx.engine
        .run(&image_bytes, DEFAULT_OCR_PROMPT)
        .await
        .map_err(|e| match e {
            OcrError::Disabled => AppError::OcrUnavailable("OCR service is disabled".to_string()),
            other => AppError::Internal(format!("OCR failed: {}", other)),
        })
}

/// Recompute the parent upload's aggregate state from the full current set
/// of child images.
///
/// Runs after every terminal image transition. Failure wins over partial
/// completion; the combined text is rebuilt on every call so partial
/// polling sees partial concatenated text.
pub async fn refresh_upload_progress(
    ctx: &OcrWorkerContext,
    upload_id: Uuid,
) -> Result<(), AppError> {
    let images = ctx.images.list_by_upload(upload_id).await?;
    if images.is_empty() {
        return Ok(());
    }

    let total = images.len();
    let completed = images
        .iter()
        .filter(|image| image.status == ProcessingStatus::Completed)
        .count();
    let any_failed = images
        .iter()
        .any(|image| image.status == ProcessingStatus::Failed);

    let (processing_status, story_status) = if any_failed {
        (ProcessingStatus::Failed, StoryStatus::Failed)
    } else if completed == total {
        (ProcessingStatus::Completed, StoryStatus::Ready)
    } else {
        (ProcessingStatus::Processing, StoryStatus::OcrInProgress)
    };

    // Progress only advances on the non-failed branches
    let progress = if any_failed {
        None
    } else {
        Some(((completed as f64 / total as f64) * 100.0).round() as i32)
    };

    let combined_text = combine_extracted_text(&images);

    ctx.uploads
        .update_processing(
            upload_id,
            ProcessingUpdate {
                processing_status,
                story_status,
                progress,
                combined_text,
                error_reason: None,
            },
        )
        .await
}

/// Join the non-empty per-image texts in ascending order, separated by a
/// blank line. `images` must already be ordered by `order_index`.
pub fn combine_extracted_text(images: &[UploadImage]) -> Option<String> {
    let pieces: Vec<&str> = images
        .iter()
        .filter_map(|image| image.extracted_text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();

    if pieces.is_empty() {
        None
    } else {
        Some(pieces.join("\n\n"))
    }
}
