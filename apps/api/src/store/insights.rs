use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::insight::InsightRow;

pub async fn latest(
    pool: &PgPool,
    teacher_id: Uuid,
    subject: &str,
) -> Result<Option<InsightRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT * FROM insights
        WHERE teacher_id = $1 AND subject = $2
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(teacher_id)
    .bind(subject)
    .fetch_optional(pool)
    .await
}

pub async fn insert(
    pool: &PgPool,
    teacher_id: Uuid,
    subject: &str,
    key_findings: &[String],
    recommendations: &[String],
) -> Result<InsightRow, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO insights (id, teacher_id, subject, key_findings, recommendations)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(teacher_id)
    .bind(subject)
    .bind(Json(key_findings))
    .bind(Json(recommendations))
    .fetch_one(pool)
    .await
}
