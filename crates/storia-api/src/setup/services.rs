//! Service and repository initialization.
//!
//! Everything is constructed here and injected into `AppState`; no service
//! lives in a global.

use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use storia_core::Config;
use storia_db::{UploadImageRepository, UploadImageStore, UploadRepository, UploadStore};
use storia_ocr::{AnthropicOcrProvider, GoogleVisionOcrProvider, OcrEngine, OcrProvider};
use storia_storage::Storage;

use crate::job_queue::OcrJobQueue;
use crate::services::upload::{OcrWorkerContext, UploadService};
use crate::state::AppState;

/// Initialize all services and repositories
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let uploads: Arc<dyn UploadStore> = Arc::new(UploadRepository::new(pool.clone()));
    let images: Arc<dyn UploadImageStore> = Arc::new(UploadImageRepository::new(pool.clone()));

    let engine = Arc::new(build_ocr_engine(config)?);
    if engine.is_enabled() {
        tracing::info!(
            timeout_secs = config.ocr_timeout_seconds,
            workers = config.ocr_max_workers,
            "OCR engine enabled"
        );
    } else {
        tracing::warn!("OCR engine disabled; all-image uploads will be rejected");
    }

    let worker_ctx = OcrWorkerContext {
        uploads: uploads.clone(),
        images: images.clone(),
        storage: storage.clone(),
        engine: engine.clone(),
    };
    let ocr_queue = if engine.is_enabled() {
        OcrJobQueue::new(worker_ctx, config.ocr_max_workers, config.ocr_queue_size)
    } else {
        OcrJobQueue::dummy()
    };

    let upload_service = UploadService::new(
        uploads,
        images,
        storage.clone(),
        engine,
        ocr_queue,
    );

    Ok(Arc::new(AppState {
        pool,
        upload_service,
        storage,
        config: config.clone(),
    }))
}

/// Build the ordered-provider OCR engine from configuration. Providers are
/// tried in declaration order: Anthropic first, Google Vision as fallback.
fn build_ocr_engine(config: &Config) -> Result<OcrEngine> {
    let mut providers: Vec<Arc<dyn OcrProvider>> = Vec::new();

    if let Some(api_key) = &config.anthropic_api_key {
        let provider =
            AnthropicOcrProvider::new(api_key.clone(), config.anthropic_ocr_model.clone())
                .map_err(|e| anyhow::anyhow!("Failed to build Anthropic OCR provider: {}", e))?;
        providers.push(Arc::new(provider));
    }

    if let Some(api_key) = &config.google_vision_api_key {
        let provider = GoogleVisionOcrProvider::new(api_key.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build Google Vision OCR provider: {}", e))?;
        providers.push(Arc::new(provider));
    }

    Ok(OcrEngine::new(
        providers,
        config.ocr_enabled,
        Duration::from_secs(config.ocr_timeout_seconds),
    ))
}
