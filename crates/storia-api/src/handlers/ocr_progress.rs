use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use storia_core::models::OcrProgressResponse;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v0/uploads/{id}/ocr-progress",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Upload id")
    ),
    responses(
        (status = 200, description = "OCR progress for polling clients", body = OcrProgressResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_ocr_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OcrProgressResponse>, HttpAppError> {
    let response = state.upload_service.get_ocr_progress(id).await?;
    Ok(Json(response))
}
