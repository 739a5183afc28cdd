//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use storia_core::models::{
    ContentKind, OcrProgressResponse, ProcessingStatus, StoryStatus, UploadImageResponse,
    UploadResponse, Visibility,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::upload_create::create_upload,
        crate::handlers::upload_get::get_upload,
        crate::handlers::ocr_progress::get_ocr_progress,
    ),
    components(schemas(
        UploadResponse,
        UploadImageResponse,
        OcrProgressResponse,
        ContentKind,
        Visibility,
        StoryStatus,
        ProcessingStatus,
        ErrorResponse,
    )),
    tags(
        (name = "uploads", description = "Upload ingestion and OCR progress polling")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
