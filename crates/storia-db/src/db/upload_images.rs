//! Repository for the `upload_images` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use storia_core::models::{NewUploadImage, ProcessingStatus, UploadImage, UploadImagePatch};
use storia_core::AppError;

use super::store::UploadImageStore;

/// Database row for the upload_images table.
#[derive(Debug, FromRow)]
pub struct UploadImageRow {
    pub id: Uuid,
    pub upload_id: Uuid,
    pub storage_path: String,
    pub mime_type: String,
    pub order_index: i32,
    pub file_size: Option<i64>,
    pub status: String,
    pub progress: i32,
    pub story_id: Option<Uuid>,
    pub public_url: Option<String>,
    pub extracted_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UploadImageRow> for UploadImage {
    fn from(row: UploadImageRow) -> Self {
        UploadImage {
            id: row.id,
            upload_id: row.upload_id,
            storage_path: row.storage_path,
            mime_type: row.mime_type,
            order_index: row.order_index,
            file_size: row.file_size,
            status: ProcessingStatus::parse(&row.status),
            progress: row.progress,
            story_id: row.story_id,
            public_url: row.public_url,
            extracted_text: row.extracted_text,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insert one image row inside the caller's transaction. Used by the upload
/// repository so the aggregate and its images commit atomically.
pub(crate) async fn insert_image(
    tx: &mut Transaction<'_, Postgres>,
    upload_id: Uuid,
    record: &NewUploadImage,
) -> Result<UploadImageRow, AppError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<Postgres, UploadImageRow>(
        r#"
        INSERT INTO upload_images (
            id, upload_id, storage_path, mime_type, order_index, file_size,
            status, progress, public_url, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(upload_id)
    .bind(&record.storage_path)
    .bind(&record.mime_type)
    .bind(record.order_index)
    .bind(record.file_size)
    .bind(record.status.as_str())
    .bind(record.progress)
    .bind(&record.public_url)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

/// Postgres repository for per-image OCR state.
#[derive(Clone)]
pub struct UploadImageRepository {
    pool: PgPool,
}

impl UploadImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadImageStore for UploadImageRepository {
    #[tracing::instrument(skip(self), fields(db.table = "upload_images", db.operation = "select"))]
    async fn list_by_upload(&self, upload_id: Uuid) -> Result<Vec<UploadImage>, AppError> {
        let rows = sqlx::query_as::<Postgres, UploadImageRow>(
            "SELECT * FROM upload_images WHERE upload_id = $1 ORDER BY order_index",
        )
        .bind(upload_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UploadImage::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "upload_images", db.operation = "select"))]
    async fn list_by_story(&self, story_id: Uuid) -> Result<Vec<UploadImage>, AppError> {
        let rows = sqlx::query_as::<Postgres, UploadImageRow>(
            "SELECT * FROM upload_images WHERE story_id = $1 ORDER BY order_index",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UploadImage::from).collect())
    }

    #[tracing::instrument(
        skip(self, patch),
        fields(db.table = "upload_images", db.operation = "update")
    )]
    async fn update_image(
        &self,
        id: Uuid,
        patch: UploadImagePatch,
    ) -> Result<Option<UploadImage>, AppError> {
        let row = sqlx::query_as::<Postgres, UploadImageRow>(
            r#"
            UPDATE upload_images
            SET status = COALESCE($2, status),
                progress = COALESCE($3, progress),
                extracted_text = COALESCE($4, extracted_text),
                public_url = COALESCE($5, public_url),
                story_id = COALESCE($6, story_id),
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.progress)
        .bind(&patch.extracted_text)
        .bind(&patch.public_url)
        .bind(patch.story_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UploadImage::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "upload_images", db.operation = "update"))]
    async fn bulk_assign_story(&self, upload_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE upload_images SET story_id = $2, updated_at = $3 WHERE upload_id = $1",
        )
        .bind(upload_id)
        .bind(story_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
