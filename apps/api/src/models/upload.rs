use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Survey,
    Masterlist,
    Psychometric,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Survey => "survey",
            UploadKind::Masterlist => "masterlist",
            UploadKind::Psychometric => "psychometric",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UploadedFileRow {
    pub id: Uuid,
    pub uploaded_by: Uuid,
    pub uploader_name: String,
    pub file_name: String,
    pub kind: String,
    pub academic_year: Option<String>,
    pub row_count: i32,
    pub uploaded_at: DateTime<Utc>,
}
