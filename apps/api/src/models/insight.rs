use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InsightRow {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub subject: String,
    pub key_findings: Json<Vec<String>>,
    pub recommendations: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}
