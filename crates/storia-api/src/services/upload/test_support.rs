//! In-memory mocks for testing the upload orchestrator without a database,
//! blob store, or OCR backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use storia_core::models::{
    NewUpload, NewUploadImage, ProcessingUpdate, StoryStatus, Upload, UploadImage,
    UploadImagePatch,
};
use storia_core::{AppError, StorageBackend};
use storia_db::{UploadImageStore, UploadStore};
use storia_ocr::{OcrEngine, OcrError, OcrProvider, OcrResult};
use storia_storage::{Storage, StorageError, StorageResult};

use crate::job_queue::OcrJobQueue;
use crate::services::upload::ocr::OcrWorkerContext;
use crate::services::upload::service::UploadService;

// ----- Mock blob storage -----

/// In-memory storage with injectable failures.
pub struct MockStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    upload_calls: AtomicUsize,
    fail_upload_at: Option<usize>,
    fail_deletes: bool,
    fail_public_urls: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            upload_calls: AtomicUsize::new(0),
            fail_upload_at: None,
            fail_deletes: false,
            fail_public_urls: false,
        }
    }

    /// Fail the n-th upload call (1-based).
    pub fn fail_upload_at(mut self, call: usize) -> Self {
        self.fail_upload_at = Some(call);
        self
    }

    pub fn fail_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn fail_public_urls(mut self) -> Self {
        self.fail_public_urls = true;
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        storage_key: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let call = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_upload_at == Some(call) {
            return Err(StorageError::UploadFailed(format!(
                "injected failure on upload #{}",
                call
            )));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(format!("http://mock-storage/{}", storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_deletes {
            return Err(StorageError::DeleteFailed("injected delete failure".to_string()));
        }
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn public_url(&self, storage_key: &str) -> StorageResult<String> {
        if self.fail_public_urls {
            return Err(StorageError::BackendError(
                "injected URL resolution failure".to_string(),
            ));
        }
        Ok(format!("http://mock-storage/{}", storage_key))
    }

    fn fallback_url(&self, storage_key: &str) -> String {
        format!("http://mock-storage/fallback/{}", storage_key)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.contains(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

// ----- Mock record store -----

#[derive(Default)]
struct MockStoreInner {
    uploads: HashMap<Uuid, Upload>,
    images: HashMap<Uuid, UploadImage>,
}

/// In-memory record store implementing both store traits over one dataset.
#[derive(Default)]
pub struct MockStore {
    inner: Mutex<MockStoreInner>,
    fail_create: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn upload_count(&self) -> usize {
        self.inner.lock().unwrap().uploads.len()
    }

    pub fn image_count(&self) -> usize {
        self.inner.lock().unwrap().images.len()
    }

    pub fn upload(&self, id: Uuid) -> Upload {
        self.inner.lock().unwrap().uploads[&id].clone()
    }

    pub fn image(&self, id: Uuid) -> UploadImage {
        self.inner.lock().unwrap().images[&id].clone()
    }
}

#[async_trait]
impl UploadStore for MockStore {
    async fn create_with_images(
        &self,
        upload: NewUpload,
        images: Vec<NewUploadImage>,
    ) -> Result<(Upload, Vec<UploadImage>), AppError> {
        if self.fail_create {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }

        let now = Utc::now();
        let created = Upload {
            id: Uuid::new_v4(),
            user_id: upload.user_id,
            content_kind: upload.content_kind,
            visibility: upload.visibility,
            title: upload.title,
            description: upload.description,
            content_file_id: upload.content_file_id,
            thumbnail_file_id: upload.thumbnail_file_id,
            status: upload.status,
            processing_status: upload.processing_status,
            progress: upload.progress,
            extracted_text: upload.extracted_text,
            ocr_text: upload.ocr_text,
            error_reason: None,
            created_at: now,
            updated_at: now,
        };

        let image_rows: Vec<UploadImage> = images
            .into_iter()
            .map(|image| UploadImage {
                id: Uuid::new_v4(),
                upload_id: created.id,
                storage_path: image.storage_path,
                mime_type: image.mime_type,
                order_index: image.order_index,
                file_size: image.file_size,
                status: image.status,
                progress: image.progress,
                story_id: None,
                public_url: image.public_url,
                extracted_text: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut inner = self.inner.lock().unwrap();
        inner.uploads.insert(created.id, created.clone());
        for row in &image_rows {
            inner.images.insert(row.id, row.clone());
        }

        Ok((created, image_rows))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        Ok(self.inner.lock().unwrap().uploads.get(&id).cloned())
    }

    async fn update_processing(
        &self,
        id: Uuid,
        update: ProcessingUpdate,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(upload) = inner.uploads.get_mut(&id) {
            // Mirrors the repository's sticky-FAILED guard
            let failed = upload.processing_status == storia_core::models::ProcessingStatus::Failed;
            if !failed {
                upload.processing_status = update.processing_status;
                upload.status = update.story_status;
                if let Some(progress) = update.progress {
                    upload.progress = progress;
                }
            }
            if let Some(text) = update.combined_text {
                upload.extracted_text = Some(text.clone());
                upload.ocr_text = Some(text);
            }
            if let Some(reason) = update.error_reason {
                upload.error_reason = Some(reason);
            }
            upload.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(upload) = inner.uploads.get_mut(&id) {
            upload.status = StoryStatus::Ready;
            upload.processing_status = storia_core::models::ProcessingStatus::Completed;
            upload.progress = 100;
            upload.error_reason = None;
            upload.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(upload) = inner.uploads.get_mut(&id) {
            upload.status = StoryStatus::Failed;
            upload.processing_status = storia_core::models::ProcessingStatus::Failed;
            upload.error_reason = Some(reason.to_string());
            upload.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl UploadImageStore for MockStore {
    async fn list_by_upload(&self, upload_id: Uuid) -> Result<Vec<UploadImage>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut images: Vec<UploadImage> = inner
            .images
            .values()
            .filter(|image| image.upload_id == upload_id)
            .cloned()
            .collect();
        images.sort_by_key(|image| image.order_index);
        Ok(images)
    }

    async fn list_by_story(&self, story_id: Uuid) -> Result<Vec<UploadImage>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut images: Vec<UploadImage> = inner
            .images
            .values()
            .filter(|image| image.story_id == Some(story_id))
            .cloned()
            .collect();
        images.sort_by_key(|image| image.order_index);
        Ok(images)
    }

    async fn update_image(
        &self,
        id: Uuid,
        patch: UploadImagePatch,
    ) -> Result<Option<UploadImage>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(image) = inner.images.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = patch.status {
            image.status = status;
        }
        if let Some(progress) = patch.progress {
            image.progress = progress;
        }
        if let Some(text) = patch.extracted_text {
            image.extracted_text = Some(text);
        }
        if let Some(url) = patch.public_url {
            image.public_url = Some(url);
        }
        if let Some(story_id) = patch.story_id {
            image.story_id = Some(story_id);
        }
        image.updated_at = Utc::now();
        Ok(Some(image.clone()))
    }

    async fn bulk_assign_story(&self, upload_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        for image in inner.images.values_mut() {
            if image.upload_id == upload_id {
                image.story_id = Some(story_id);
                image.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

// ----- Scripted OCR provider -----

/// Provider that echoes the image bytes as text, or fails when the bytes
/// start with `FAIL`. Lets tests script per-image outcomes through payload
/// content alone.
pub struct ScriptedOcrProvider;

#[async_trait]
impl OcrProvider for ScriptedOcrProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn recognize(&self, image: &[u8], _prompt: &str) -> OcrResult<String> {
        if image.starts_with(b"FAIL") {
            return Err(OcrError::Provider {
                provider: "scripted",
                message: "scripted failure".to_string(),
            });
        }
        Ok(String::from_utf8_lossy(image).into_owned())
    }
}

pub fn test_engine() -> Arc<OcrEngine> {
    Arc::new(OcrEngine::new(
        vec![Arc::new(ScriptedOcrProvider) as Arc<dyn OcrProvider>],
        true,
        Duration::from_secs(5),
    ))
}

pub fn disabled_engine() -> Arc<OcrEngine> {
    Arc::new(OcrEngine::disabled())
}

// ----- Test harness -----

pub struct TestHarness {
    pub store: Arc<MockStore>,
    pub storage: Arc<MockStorage>,
    pub engine: Arc<OcrEngine>,
    pub service: UploadService,
    pub ctx: OcrWorkerContext,
}

/// Build a service wired to in-memory collaborators. Jobs submitted through
/// the service's queue are discarded, so tests drive OCR deterministically
/// via [`crate::services::upload::ocr::process_image_ocr`].
pub fn harness(engine: Arc<OcrEngine>) -> TestHarness {
    harness_with_storage(Arc::new(MockStorage::new()), engine)
}

pub fn harness_with_storage(storage: Arc<MockStorage>, engine: Arc<OcrEngine>) -> TestHarness {
    let store = Arc::new(MockStore::new());
    harness_with(store, storage, engine)
}

pub fn harness_with(
    store: Arc<MockStore>,
    storage: Arc<MockStorage>,
    engine: Arc<OcrEngine>,
) -> TestHarness {
    let uploads: Arc<dyn UploadStore> = store.clone();
    let images: Arc<dyn UploadImageStore> = store.clone();
    let ctx = OcrWorkerContext {
        uploads: uploads.clone(),
        images: images.clone(),
        storage: storage.clone(),
        engine: engine.clone(),
    };
    let service = UploadService::new(
        uploads,
        images,
        storage.clone(),
        engine.clone(),
        OcrJobQueue::dummy(),
    );
    TestHarness {
        store,
        storage,
        engine,
        service,
        ctx,
    }
}
