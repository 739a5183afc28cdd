//! Bounded OCR job queue.
//!
//! One job per image, consumed by a worker pool bounded by a semaphore.
//! Jobs run off the request path so upload creation returns as soon as the
//! records exist; sibling jobs may interleave arbitrarily, which the
//! snapshot-based aggregation tolerates.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::services::upload::ocr::{process_image_ocr, OcrWorkerContext};

#[derive(Debug, Clone)]
pub struct OcrJob {
    pub upload_id: Uuid,
    pub image_id: Uuid,
    pub storage_path: String,
}

pub struct OcrJobQueue {
    tx: mpsc::Sender<OcrJob>,
}

impl OcrJobQueue {
    /// Create a new OCR job queue with a bounded channel and a worker pool
    /// processing at most `max_concurrent` jobs at a time.
    pub fn new(ctx: OcrWorkerContext, max_concurrent: usize, queue_size: usize) -> Self {
        let queue_size = queue_size.max(1);
        let max_concurrent = max_concurrent.max(1);

        let (tx, rx) = mpsc::channel(queue_size);

        tokio::spawn(async move {
            Self::worker_pool(rx, ctx, max_concurrent).await;
        });

        tracing::info!(
            queue_size = queue_size,
            max_concurrent = max_concurrent,
            "OCR job queue initialized with bounded channel"
        );

        Self { tx }
    }

    /// No-op queue used when OCR is disabled: accepts and discards jobs.
    /// Nothing submits to it in that configuration, but a submit must not
    /// error the creation request.
    pub fn dummy() -> Self {
        let (tx, mut rx) = mpsc::channel::<OcrJob>(16);
        tokio::spawn(async move { while rx.recv().await.is_some() {} });
        Self { tx }
    }

    /// Submit a job, waiting if the queue is full.
    #[tracing::instrument(skip(self, job), fields(job.type = "ocr", upload_id = %job.upload_id, image_id = %job.image_id))]
    pub async fn submit(&self, job: OcrJob) -> Result<()> {
        tracing::info!("Enqueuing OCR job");
        self.tx
            .send(job)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to submit OCR job: {}", e))?;
        Ok(())
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<OcrJob>,
        ctx: OcrWorkerContext,
        max_concurrent: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        while let Some(job) = rx.recv().await {
            let permit = semaphore.clone().acquire_owned().await;
            let ctx = ctx.clone();

            tokio::spawn(async move {
                let _permit = permit;
                Self::process_job(job, ctx).await;
            });
        }
    }

    async fn process_job(job: OcrJob, ctx: OcrWorkerContext) {
        let start = std::time::Instant::now();

        let result = process_image_ocr(&ctx, job.upload_id, job.image_id, &job.storage_path).await;

        let elapsed = start.elapsed();
        match result {
            Ok(()) => {
                tracing::info!(
                    upload_id = %job.upload_id,
                    image_id = %job.image_id,
                    duration_ms = elapsed.as_millis() as u64,
                    "OCR job finished"
                );
            }
            Err(e) => {
                // A job error here means the state writes themselves failed;
                // the OCR outcome was already absorbed into persisted state.
                tracing::error!(
                    upload_id = %job.upload_id,
                    image_id = %job.image_id,
                    error = %e,
                    duration_ms = elapsed.as_millis() as u64,
                    "OCR job processing failed"
                );
            }
        }
    }
}

impl Clone for OcrJobQueue {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}
