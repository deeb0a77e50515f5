use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};

use crate::models::profile::{LinkedStudentRow, StudentProfileRow};

/// Filters over a teacher's links. `None` means no filter.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub subject: Option<String>,
    pub academic_year: Option<String>,
}

pub struct NewProfile<'a> {
    pub student_id: &'a str,
    pub academic_year: &'a str,
    pub name: &'a str,
    pub year_level: &'a str,
    pub trait_scores: serde_json::Value,
    pub dominant_trait: String,
}

/// Newest profile for a student, any academic year.
pub async fn find_latest(
    pool: &PgPool,
    student_id: &str,
) -> Result<Option<StudentProfileRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM latest_student_profiles WHERE student_id = $1")
        .bind(student_id)
        .fetch_optional(pool)
        .await
}

pub async fn has_any<'e>(executor: impl PgExecutor<'e>, student_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM student_profiles WHERE student_id = $1)")
        .bind(student_id)
        .fetch_one(executor)
        .await
}

/// Which of `student_ids` already have a profile for the academic year.
pub async fn existing_ids<'e>(
    executor: impl PgExecutor<'e>,
    academic_year: &str,
    student_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT student_id FROM student_profiles WHERE academic_year = $1 AND student_id = ANY($2)",
    )
    .bind(academic_year)
    .bind(student_ids)
    .fetch_all(executor)
    .await
}

pub async fn insert<'e>(executor: impl PgExecutor<'e>, profile: NewProfile<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO student_profiles
            (student_id, academic_year, name, year_level, trait_scores, dominant_trait)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(profile.student_id)
    .bind(profile.academic_year)
    .bind(profile.name)
    .bind(profile.year_level)
    .bind(profile.trait_scores)
    .bind(profile.dominant_trait)
    .execute(executor)
    .await?;
    Ok(())
}

/// Latest profile of every student linked to the teacher, once per student.
pub async fn for_teacher(
    pool: &PgPool,
    teacher_id: uuid::Uuid,
    filter: &LinkFilter,
) -> Result<Vec<StudentProfileRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT p.* FROM latest_student_profiles p
        WHERE p.student_id IN (
            SELECT ss.student_id FROM student_subjects ss
            WHERE ss.teacher_id = $1
              AND ($2::text IS NULL OR ss.subject = $2)
              AND ($3::text IS NULL OR ss.academic_year = $3)
        )
        ORDER BY p.name
        "#,
    )
    .bind(teacher_id)
    .bind(filter.subject.as_deref())
    .bind(filter.academic_year.as_deref())
    .fetch_all(pool)
    .await
}

/// One row per link, with the teacher's contact overrides applied.
pub async fn linked_students(
    pool: &PgPool,
    teacher_id: uuid::Uuid,
    filter: &LinkFilter,
) -> Result<Vec<LinkedStudentRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT ss.student_id, COALESCE(ss.name, p.name) AS name, ss.email,
               ss.subject, ss.academic_year, p.year_level,
               p.trait_scores, p.dominant_trait, p.created_at
        FROM student_subjects ss
        JOIN latest_student_profiles p ON p.student_id = ss.student_id
        WHERE ss.teacher_id = $1
          AND ($2::text IS NULL OR ss.subject = $2)
          AND ($3::text IS NULL OR ss.academic_year = $3)
        ORDER BY ss.subject, name
        "#,
    )
    .bind(teacher_id)
    .bind(filter.subject.as_deref())
    .bind(filter.academic_year.as_deref())
    .fetch_all(pool)
    .await
}

/// Every stored profile, all academic years, newest first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<StudentProfileRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM student_profiles ORDER BY created_at DESC, student_id")
        .fetch_all(pool)
        .await
}

pub async fn count_created_since(pool: &PgPool, since: NaiveDate) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM student_profiles WHERE created_at >= $1::date")
        .bind(since)
        .fetch_one(pool)
        .await
}

/// Stored dominant labels with their profile counts.
pub async fn dominant_label_counts(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT dominant_trait, COUNT(*) AS count
        FROM student_profiles
        GROUP BY dominant_trait
        ORDER BY count DESC, dominant_trait
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Renames a student across all academic years.
pub async fn update_identity(
    pool: &PgPool,
    student_id: &str,
    name: &str,
    year_level: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE student_profiles SET name = $1, year_level = $2 WHERE student_id = $3")
        .bind(name)
        .bind(year_level)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes every profile of a student along with the teacher links to it.
pub async fn delete_student(pool: &PgPool, student_id: &str) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM student_subjects WHERE student_id = $1")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM student_profiles WHERE student_id = $1")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected())
}
