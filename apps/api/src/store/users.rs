use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Role;
use crate::models::user::{UserRow, UserSummaryRow};

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<UserRow, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
}

/// All users, newest first, with the number of files each uploaded.
pub async fn list_with_upload_counts(pool: &PgPool) -> Result<Vec<UserSummaryRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT u.id, u.name, u.email, u.role, u.created_at,
               COUNT(f.id) AS upload_count
        FROM users u
        LEFT JOIN uploaded_files f ON f.uploaded_by = u.id
        GROUP BY u.id
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}
