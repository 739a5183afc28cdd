//! Upload orchestration service.
//!
//! Owns the write path (stage blobs, classify, persist, fan out OCR jobs)
//! and the polling read path. Collaborators are injected so the whole
//! orchestration is testable against in-memory stores.

use std::sync::Arc;

use storia_core::models::{
    NewUpload, NewUploadImage, OcrProgressResponse, ProcessingStatus, ProcessingUpdate,
    StoryStatus, Upload, UploadImage, UploadImagePatch, UploadResponse,
};
use storia_core::AppError;
use storia_db::{UploadImageStore, UploadStore};
use storia_ocr::OcrEngine;
use storia_storage::{build_object_key, Storage};
use uuid::Uuid;

use super::classify;
use super::staging::{resolve_public_url, BlobStager};
use super::types::{CreateUploadRequest, PreparedFile, UploadFilePayload};
use crate::job_queue::{OcrJob, OcrJobQueue};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Clone)]
pub struct UploadService {
    uploads: Arc<dyn UploadStore>,
    images: Arc<dyn UploadImageStore>,
    storage: Arc<dyn Storage>,
    engine: Arc<OcrEngine>,
    queue: OcrJobQueue,
}

impl UploadService {
    pub fn new(
        uploads: Arc<dyn UploadStore>,
        images: Arc<dyn UploadImageStore>,
        storage: Arc<dyn Storage>,
        engine: Arc<OcrEngine>,
        queue: OcrJobQueue,
    ) -> Self {
        Self {
            uploads,
            images,
            storage,
            engine,
            queue,
        }
    }

    /// Create an upload from the submitted file set.
    ///
    /// Blobs are staged first; any failure after that point rolls back every
    /// blob written during this request before the error is returned.
    #[tracing::instrument(
        skip(self, request, content_files, thumbnail),
        fields(user_id = %request.user_id, file_count = content_files.len())
    )]
    pub async fn create_upload(
        &self,
        request: CreateUploadRequest,
        content_files: Vec<UploadFilePayload>,
        thumbnail: Option<UploadFilePayload>,
    ) -> Result<UploadResponse, AppError> {
        if content_files.is_empty() {
            return Err(AppError::InvalidInput(
                "No content files provided".to_string(),
            ));
        }

        let mut stager = BlobStager::new(self.storage.clone());
        match self
            .create_upload_staged(&mut stager, request, content_files, thumbnail)
            .await
        {
            Ok(response) => Ok(response),
            Err(err) => {
                stager.rollback().await;
                Err(err)
            }
        }
    }

    async fn create_upload_staged(
        &self,
        stager: &mut BlobStager,
        request: CreateUploadRequest,
        content_files: Vec<UploadFilePayload>,
        thumbnail: Option<UploadFilePayload>,
    ) -> Result<UploadResponse, AppError> {
        let mut prepared_files = Vec::with_capacity(content_files.len());
        for (index, payload) in content_files.into_iter().enumerate() {
            let storage_key = build_object_key(request.user_id, &payload.filename);
            let content_type = payload
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
            stager
                .stage(&storage_key, &content_type, payload.data.clone())
                .await?;
            let public_url = stager.resolve_public_url(&storage_key).await;
            let is_image = classify::is_image_file(&payload);
            prepared_files.push(PreparedFile {
                payload,
                storage_key,
                public_url: Some(public_url),
                is_image,
                order_index: index as i32,
            });
        }

        let mut thumbnail_key = None;
        let mut thumbnail_url = None;
        if let Some(thumb) = thumbnail {
            let storage_key = build_object_key(request.user_id, &thumb.filename);
            let content_type = thumb
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string());
            stager.stage(&storage_key, &content_type, thumb.data).await?;
            thumbnail_url = Some(stager.resolve_public_url(&storage_key).await);
            thumbnail_key = Some(storage_key);
        }

        let initial = classify::derive_initial_state(&prepared_files, self.engine.is_enabled())?;

        let new_upload = NewUpload {
            user_id: request.user_id,
            content_kind: request.content_kind,
            visibility: request.visibility,
            title: request.title,
            description: request.description,
            content_file_id: prepared_files[0].storage_key.clone(),
            thumbnail_file_id: thumbnail_key,
            status: initial.status,
            processing_status: initial.processing_status,
            progress: initial.progress,
            extracted_text: initial.extracted_text,
            ocr_text: initial.ocr_text,
        };

        let image_records: Vec<NewUploadImage> = prepared_files
            .iter()
            .filter(|file| file.is_image)
            .map(|file| NewUploadImage {
                storage_path: file.storage_key.clone(),
                mime_type: file
                    .payload
                    .content_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string()),
                order_index: file.order_index,
                file_size: Some(file.payload.data.len() as i64),
                status: if new_upload.processing_status == ProcessingStatus::Processing {
                    ProcessingStatus::Processing
                } else {
                    ProcessingStatus::Pending
                },
                progress: 0,
                public_url: file.public_url.clone(),
            })
            .collect();

        let dispatch_jobs = new_upload.processing_status == ProcessingStatus::Processing;

        let (upload, image_rows) = self
            .uploads
            .create_with_images(new_upload, image_records)
            .await?;

        if dispatch_jobs {
            for image in &image_rows {
                self.dispatch_ocr_job(upload.id, image).await;
            }
        }

        let content_url = prepared_files[0].public_url.clone();
        Ok(UploadResponse::from_upload(
            upload,
            content_url,
            thumbnail_url,
            image_rows,
        ))
    }

    /// Submit one image's OCR job. An enqueue failure follows the same path
    /// as a failed job: the image and its parent are marked FAILED, and the
    /// creation request itself still succeeds.
    async fn dispatch_ocr_job(&self, upload_id: Uuid, image: &UploadImage) {
        let job = OcrJob {
            upload_id,
            image_id: image.id,
            storage_path: image.storage_path.clone(),
        };
        if let Err(err) = self.queue.submit(job).await {
            tracing::error!(
                upload_id = %upload_id,
                image_id = %image.id,
                error = %err,
                "Failed to enqueue OCR job"
            );
            let image_update = self
                .images
                .update_image(
                    image.id,
                    UploadImagePatch {
                        status: Some(ProcessingStatus::Failed),
                        progress: Some(0),
                        ..Default::default()
                    },
                )
                .await;
            if let Err(update_err) = image_update {
                tracing::error!(image_id = %image.id, error = %update_err, "Failed to mark image failed");
            }
            let upload_update = self
                .uploads
                .update_processing(
                    upload_id,
                    ProcessingUpdate {
                        processing_status: ProcessingStatus::Failed,
                        story_status: StoryStatus::Failed,
                        progress: None,
                        combined_text: None,
                        error_reason: Some("Failed to enqueue OCR job".to_string()),
                    },
                )
                .await;
            if let Err(update_err) = upload_update {
                tracing::error!(upload_id = %upload_id, error = %update_err, "Failed to mark upload failed");
            }
        }
    }

    /// Fetch the fully materialized upload view.
    #[tracing::instrument(skip(self), fields(upload_id = %id))]
    pub async fn get_upload(&self, id: Uuid) -> Result<UploadResponse, AppError> {
        let upload = self.find_upload(id).await?;
        let content_url =
            Some(resolve_public_url(self.storage.as_ref(), &upload.content_file_id).await);
        let thumbnail_url = match &upload.thumbnail_file_id {
            Some(key) => Some(resolve_public_url(self.storage.as_ref(), key).await),
            None => None,
        };
        let images = self.images.list_by_upload(id).await?;
        Ok(UploadResponse::from_upload(
            upload,
            content_url,
            thumbnail_url,
            images,
        ))
    }

    /// The polling contract: aggregate state plus ordered per-image states.
    #[tracing::instrument(skip(self), fields(upload_id = %id))]
    pub async fn get_ocr_progress(&self, id: Uuid) -> Result<OcrProgressResponse, AppError> {
        let upload = self.find_upload(id).await?;
        let images = self.images.list_by_upload(id).await?;
        Ok(OcrProgressResponse {
            status: upload.processing_status,
            story_status: upload.status,
            progress: upload.progress,
            ocr_text: upload.ocr_text,
            extracted_text: upload.extracted_text,
            images: images.into_iter().map(Into::into).collect(),
        })
    }

    async fn find_upload(&self, id: Uuid) -> Result<Upload, AppError> {
        self.uploads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload with id {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::upload::test_support::{
        disabled_engine, harness, harness_with, test_engine, MockStorage, MockStore,
    };
    use storia_core::models::{ContentKind, Visibility};

    fn request() -> CreateUploadRequest {
        CreateUploadRequest {
            user_id: Uuid::new_v4(),
            content_kind: ContentKind::Text,
            visibility: Visibility::Public,
            title: "My story".to_string(),
            description: Some("about things".to_string()),
        }
    }

    fn comic_request() -> CreateUploadRequest {
        CreateUploadRequest {
            content_kind: ContentKind::Comic,
            ..request()
        }
    }

    fn text_file(name: &str, content: &str) -> UploadFilePayload {
        UploadFilePayload {
            filename: name.to_string(),
            content_type: Some("text/plain".to_string()),
            data: content.as_bytes().to_vec(),
        }
    }

    fn image_file(name: &str, data: &[u8]) -> UploadFilePayload {
        UploadFilePayload {
            filename: name.to_string(),
            content_type: Some("image/png".to_string()),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn text_upload_completes_synchronously() {
        let h = harness(test_engine());

        let response = h
            .service
            .create_upload(request(), vec![text_file("story.txt", "Hello world")], None)
            .await
            .unwrap();

        assert_eq!(response.status, StoryStatus::Ready);
        assert_eq!(response.processing_status, ProcessingStatus::Completed);
        assert_eq!(response.progress, 100);
        assert_eq!(response.extracted_text.as_deref(), Some("Hello world"));
        assert_eq!(response.ocr_text.as_deref(), Some("Hello world"));
        assert!(response.images.is_empty());
        assert!(response.content_url.is_some());
        assert_eq!(h.storage.object_count(), 1);
    }

    #[tokio::test]
    async fn image_upload_creates_rows_and_starts_processing() {
        let h = harness(test_engine());

        let files = vec![
            image_file("page1.png", b"one"),
            image_file("page2.png", b"two"),
            image_file("page3.png", b"three"),
        ];
        let response = h
            .service
            .create_upload(comic_request(), files, None)
            .await
            .unwrap();

        assert_eq!(response.status, StoryStatus::OcrInProgress);
        assert_eq!(response.processing_status, ProcessingStatus::Processing);
        assert_eq!(response.progress, 0);
        assert_eq!(response.images.len(), 3);
        for (index, image) in response.images.iter().enumerate() {
            assert_eq!(image.order, index as i32);
            assert!(matches!(
                image.status,
                ProcessingStatus::Pending | ProcessingStatus::Processing
            ));
        }
        assert_eq!(h.store.image_count(), 3);
        assert_eq!(h.storage.object_count(), 3);
    }

    #[tokio::test]
    async fn thumbnail_is_staged_and_referenced() {
        let h = harness(test_engine());

        let response = h
            .service
            .create_upload(
                request(),
                vec![text_file("story.txt", "content here")],
                Some(image_file("cover.png", b"thumb")),
            )
            .await
            .unwrap();

        assert!(response.thumbnail_url.is_some());
        assert_eq!(h.storage.object_count(), 2);
    }

    #[tokio::test]
    async fn empty_file_set_is_rejected_before_staging() {
        let h = harness(test_engine());

        let err = h
            .service
            .create_upload(request(), vec![], None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(h.storage.is_empty());
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn mixed_submission_is_rejected_and_blobs_rolled_back() {
        let h = harness(test_engine());

        let files = vec![
            image_file("page1.png", b"img"),
            text_file("story.txt", "text"),
        ];
        let err = h
            .service
            .create_upload(comic_request(), files, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(h.storage.is_empty());
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn ocr_disabled_rejects_images_and_rolls_back_all_blobs() {
        let h = harness(disabled_engine());

        let files = vec![
            image_file("page1.png", b"a"),
            image_file("page2.png", b"b"),
            image_file("page3.png", b"c"),
        ];
        let err = h
            .service
            .create_upload(comic_request(), files, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OcrUnavailable(_)));
        assert!(h.storage.is_empty());
        assert_eq!(h.store.upload_count(), 0);
        assert_eq!(h.store.image_count(), 0);
    }

    #[tokio::test]
    async fn blob_write_failure_mid_staging_rolls_back_earlier_blobs() {
        let storage = Arc::new(MockStorage::new().fail_upload_at(2));
        let h = harness_with(Arc::new(MockStore::new()), storage, test_engine());

        let files = vec![
            image_file("page1.png", b"a"),
            image_file("page2.png", b"b"),
            image_file("page3.png", b"c"),
        ];
        let err = h
            .service
            .create_upload(comic_request(), files, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert!(h.storage.is_empty());
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn record_store_failure_rolls_back_blobs() {
        let h = harness_with(
            Arc::new(MockStore::new().fail_create()),
            Arc::new(MockStorage::new()),
            test_engine(),
        );

        let err = h
            .service
            .create_upload(request(), vec![text_file("story.txt", "content")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(h.storage.is_empty());
    }

    #[tokio::test]
    async fn unextractable_document_is_rejected() {
        let h = harness(test_engine());

        let err = h
            .service
            .create_upload(request(), vec![text_file("empty.txt", "   ")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ExtractionFailed(_)));
        assert!(h.storage.is_empty());
        assert_eq!(h.store.upload_count(), 0);
    }

    #[tokio::test]
    async fn get_upload_returns_not_found_for_unknown_id() {
        let h = harness(test_engine());
        let err = h.service.get_upload(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_upload_resolves_urls_and_images() {
        let h = harness(test_engine());
        let created = h
            .service
            .create_upload(
                comic_request(),
                vec![image_file("page1.png", b"a"), image_file("page2.png", b"b")],
                None,
            )
            .await
            .unwrap();

        let fetched = h.service.get_upload(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.images.len(), 2);
        assert!(fetched.content_url.is_some());
        assert_eq!(fetched.images[0].order, 0);
        assert_eq!(fetched.images[1].order, 1);
    }

    #[tokio::test]
    async fn ocr_progress_shape_matches_polling_contract() {
        let h = harness(test_engine());
        let created = h
            .service
            .create_upload(comic_request(), vec![image_file("page1.png", b"a")], None)
            .await
            .unwrap();

        let progress = h.service.get_ocr_progress(created.id).await.unwrap();
        assert_eq!(progress.status, ProcessingStatus::Processing);
        assert_eq!(progress.story_status, StoryStatus::OcrInProgress);
        assert_eq!(progress.progress, 0);
        assert_eq!(progress.images.len(), 1);

        let json = serde_json::to_value(&progress).unwrap();
        assert!(json.get("storyStatus").is_some());
        assert!(json.get("images").is_some());
        assert!(json["images"][0].get("publicUrl").is_some());
        assert!(json["images"][0].get("order").is_some());
    }

    #[tokio::test]
    async fn finished_upload_images_can_be_assigned_to_a_story() {
        let h = harness(test_engine());
        let created = h
            .service
            .create_upload(
                comic_request(),
                vec![image_file("page1.png", b"a"), image_file("page2.png", b"b")],
                None,
            )
            .await
            .unwrap();

        let story_id = Uuid::new_v4();
        h.ctx
            .images
            .bulk_assign_story(created.id, story_id)
            .await
            .unwrap();

        let images = h.ctx.images.list_by_story(story_id).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].order_index, 0);
        assert_eq!(images[1].order_index, 1);

        h.ctx.uploads.mark_completed(created.id).await.unwrap();
        let upload = h.store.upload(created.id);
        assert_eq!(upload.status, StoryStatus::Ready);
        assert_eq!(upload.progress, 100);
        assert!(upload.error_reason.is_none());
    }

    #[tokio::test]
    async fn mark_failed_records_the_reason() {
        let h = harness(test_engine());
        let created = h
            .service
            .create_upload(request(), vec![text_file("story.txt", "content")], None)
            .await
            .unwrap();

        h.ctx
            .uploads
            .mark_failed(created.id, "manual takedown")
            .await
            .unwrap();

        let upload = h.store.upload(created.id);
        assert_eq!(upload.status, StoryStatus::Failed);
        assert_eq!(upload.processing_status, ProcessingStatus::Failed);
        assert_eq!(upload.error_reason.as_deref(), Some("manual takedown"));
    }

    #[tokio::test]
    async fn ocr_progress_returns_not_found_for_unknown_id() {
        let h = harness(test_engine());
        let err = h
            .service
            .get_ocr_progress(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
