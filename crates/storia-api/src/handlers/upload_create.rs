use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use storia_core::models::UploadResponse;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::multipart::extract_upload_form;

#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    responses(
        (status = 200, description = "Upload created", body = UploadResponse),
        (status = 400, description = "Invalid request shape", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Unsupported document format", body = ErrorResponse),
        (status = 422, description = "Document text could not be extracted", body = ErrorResponse),
        (status = 503, description = "OCR service disabled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let form = extract_upload_form(multipart, state.config.max_upload_size_bytes).await?;

    let response = state
        .upload_service
        .create_upload(form.request, form.content_files, form.thumbnail)
        .await?;

    Ok(Json(response))
}
