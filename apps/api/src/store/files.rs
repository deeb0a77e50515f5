use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::upload::{UploadKind, UploadedFileRow};

pub async fn record<'e>(
    executor: impl PgExecutor<'e>,
    uploaded_by: Uuid,
    file_name: &str,
    kind: UploadKind,
    academic_year: Option<&str>,
    row_count: usize,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO uploaded_files (id, uploaded_by, file_name, kind, academic_year, row_count)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(uploaded_by)
    .bind(file_name)
    .bind(kind.as_str())
    .bind(academic_year)
    .bind(i32::try_from(row_count).unwrap_or(i32::MAX))
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn list(pool: &PgPool) -> Result<Vec<UploadedFileRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT f.id, f.uploaded_by, u.name AS uploader_name, f.file_name, f.kind,
               f.academic_year, f.row_count, f.uploaded_at
        FROM uploaded_files f
        JOIN users u ON u.id = f.uploaded_by
        ORDER BY f.uploaded_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub struct UploadTotals {
    pub files: i64,
    pub active_uploaders: i64,
    pub last_upload: Option<DateTime<Utc>>,
}

pub async fn totals(pool: &PgPool) -> Result<UploadTotals, sqlx::Error> {
    let (files, active_uploaders, last_upload): (i64, i64, Option<DateTime<Utc>>) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(DISTINCT uploaded_by), MAX(uploaded_at) FROM uploaded_files",
    )
    .fetch_one(pool)
    .await?;
    Ok(UploadTotals {
        files,
        active_uploaders,
        last_upload,
    })
}
