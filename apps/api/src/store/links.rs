use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::survey::roster::RosterEntry;

/// Links a roster entry to the teacher. Returns false when the link already existed.
pub async fn link<'e>(
    executor: impl PgExecutor<'e>,
    teacher_id: Uuid,
    entry: &RosterEntry,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO student_subjects (teacher_id, student_id, subject, academic_year, year_level)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (teacher_id, student_id, subject, academic_year) DO NOTHING
        "#,
    )
    .bind(teacher_id)
    .bind(&entry.student_id)
    .bind(&entry.subject)
    .bind(&entry.academic_year)
    .bind(&entry.year_level)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_linked(pool: &PgPool, teacher_id: Uuid, student_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM student_subjects WHERE teacher_id = $1 AND student_id = $2)",
    )
    .bind(teacher_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}

pub async fn subjects(pool: &PgPool, teacher_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT subject FROM student_subjects WHERE teacher_id = $1 ORDER BY subject",
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}

/// Identifies one teacher ↔ student link.
pub struct LinkKey<'a> {
    pub teacher_id: Uuid,
    pub student_id: &'a str,
    pub subject: &'a str,
    pub academic_year: &'a str,
}

pub async fn update_contact(
    pool: &PgPool,
    key: LinkKey<'_>,
    name: &str,
    email: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE student_subjects
        SET name = $1, email = $2
        WHERE teacher_id = $3 AND student_id = $4 AND subject = $5 AND academic_year = $6
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(key.teacher_id)
    .bind(key.student_id)
    .bind(key.subject)
    .bind(key.academic_year)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn unlink(pool: &PgPool, key: LinkKey<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM student_subjects
        WHERE teacher_id = $1 AND student_id = $2 AND subject = $3 AND academic_year = $4
        "#,
    )
    .bind(key.teacher_id)
    .bind(key.student_id)
    .bind(key.subject)
    .bind(key.academic_year)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Distinct students linked to any teacher.
pub async fn count_linked_students(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(DISTINCT student_id) FROM student_subjects")
        .fetch_one(pool)
        .await
}
