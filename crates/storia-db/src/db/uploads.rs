//! Repository for the `uploads` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use storia_core::models::{
    ContentKind, NewUpload, NewUploadImage, ProcessingStatus, ProcessingUpdate, StoryStatus,
    Upload, UploadImage, Visibility,
};
use storia_core::AppError;

use super::store::UploadStore;
use super::upload_images::insert_image;

/// Database row for the uploads table. Enum columns are stored as
/// UPPER_SNAKE text and parsed leniently when mapping to the domain model.
#[derive(Debug, FromRow)]
pub struct UploadRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_type: String,
    pub visibility: String,
    pub title: String,
    pub description: Option<String>,
    pub content_file_id: String,
    pub thumbnail_file_id: Option<String>,
    pub status: String,
    pub processing_status: String,
    pub progress: i32,
    pub extracted_text: Option<String>,
    pub ocr_text: Option<String>,
    pub error_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UploadRow> for Upload {
    fn from(row: UploadRow) -> Self {
        Upload {
            id: row.id,
            user_id: row.user_id,
            content_kind: ContentKind::parse(&row.content_type),
            visibility: Visibility::parse(&row.visibility),
            title: row.title,
            description: row.description,
            content_file_id: row.content_file_id,
            thumbnail_file_id: row.thumbnail_file_id,
            status: StoryStatus::parse(&row.status),
            processing_status: ProcessingStatus::parse(&row.processing_status),
            progress: row.progress,
            extracted_text: row.extracted_text,
            ocr_text: row.ocr_text,
            error_reason: row.error_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres repository for upload aggregate records.
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_upload(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewUpload,
) -> Result<UploadRow, AppError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<Postgres, UploadRow>(
        r#"
        INSERT INTO uploads (
            id, user_id, content_type, visibility, title, description,
            content_file_id, thumbnail_file_id, status, processing_status,
            progress, extracted_text, ocr_text, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(record.user_id)
    .bind(record.content_kind.as_str())
    .bind(record.visibility.as_str())
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.content_file_id)
    .bind(&record.thumbnail_file_id)
    .bind(record.status.as_str())
    .bind(record.processing_status.as_str())
    .bind(record.progress)
    .bind(&record.extracted_text)
    .bind(&record.ocr_text)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

#[async_trait]
impl UploadStore for UploadRepository {
    #[tracing::instrument(
        skip(self, upload, images),
        fields(db.table = "uploads", db.operation = "insert", image_count = images.len())
    )]
    async fn create_with_images(
        &self,
        upload: NewUpload,
        images: Vec<NewUploadImage>,
    ) -> Result<(Upload, Vec<UploadImage>), AppError> {
        let mut tx = self.pool.begin().await?;

        let upload_row = insert_upload(&mut tx, &upload).await?;

        let mut image_rows = Vec::with_capacity(images.len());
        for image in &images {
            image_rows.push(insert_image(&mut tx, upload_row.id, image).await?);
        }

        tx.commit().await?;

        Ok((
            upload_row.into(),
            image_rows.into_iter().map(UploadImage::from).collect(),
        ))
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        let row = sqlx::query_as::<Postgres, UploadRow>("SELECT * FROM uploads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Upload::from))
    }

    #[tracing::instrument(
        skip(self, update),
        fields(
            db.table = "uploads",
            db.operation = "update",
            processing_status = %update.processing_status,
            story_status = %update.story_status
        )
    )]
    async fn update_processing(
        &self,
        id: Uuid,
        update: ProcessingUpdate,
    ) -> Result<(), AppError> {
        // FAILED is sticky: a stale concurrent recomputation must never
        // revert a failed upload, so the guard lives in the atomic UPDATE.
        sqlx::query(
            r#"
            UPDATE uploads
            SET processing_status = CASE WHEN processing_status = 'FAILED' THEN processing_status ELSE $2 END,
                status = CASE WHEN processing_status = 'FAILED' THEN status ELSE $3 END,
                progress = CASE WHEN processing_status = 'FAILED' THEN progress ELSE COALESCE($4, progress) END,
                extracted_text = COALESCE($5, extracted_text),
                ocr_text = COALESCE($5, ocr_text),
                error_reason = COALESCE($6, error_reason),
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.processing_status.as_str())
        .bind(update.story_status.as_str())
        .bind(update.progress)
        .bind(&update.combined_text)
        .bind(&update.error_reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "update"))]
    async fn mark_completed(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE uploads
            SET status = 'READY',
                processing_status = 'COMPLETED',
                progress = 100,
                error_reason = NULL,
                updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, reason), fields(db.table = "uploads", db.operation = "update"))]
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE uploads
            SET status = 'FAILED',
                processing_status = 'FAILED',
                error_reason = $2,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_maps_to_domain_with_lenient_enum_parse() {
        let now = Utc::now();
        let row = UploadRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content_type: "comic".to_string(),
            visibility: "bogus-value".to_string(),
            title: "Pages".to_string(),
            description: None,
            content_file_id: "user/key_page1.png".to_string(),
            thumbnail_file_id: None,
            status: "OCR_IN_PROGRESS".to_string(),
            processing_status: "PROCESSING".to_string(),
            progress: 0,
            extracted_text: None,
            ocr_text: None,
            error_reason: None,
            created_at: now,
            updated_at: now,
        };

        let upload = Upload::from(row);
        assert_eq!(upload.content_kind, ContentKind::Comic);
        // Unknown visibility falls back to the default rather than failing the row
        assert_eq!(upload.visibility, Visibility::Public);
        assert_eq!(upload.status, StoryStatus::OcrInProgress);
        assert_eq!(upload.processing_status, ProcessingStatus::Processing);
    }
}
