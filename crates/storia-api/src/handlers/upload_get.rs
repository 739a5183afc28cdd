use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use storia_core::models::UploadResponse;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v0/uploads/{id}",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Upload id")
    ),
    responses(
        (status = 200, description = "Upload view", body = UploadResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let response = state.upload_service.get_upload(id).await?;
    Ok(Json(response))
}
