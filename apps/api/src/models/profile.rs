use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use tracing::warn;

use crate::scoring::dominant::DominantTraits;
use crate::scoring::traits::TraitMap;

/// A stored student profile: trait totals as JSON plus the joined dominant label.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentProfileRow {
    pub student_id: String,
    pub academic_year: String,
    pub name: String,
    pub year_level: String,
    pub trait_scores: Value,
    pub dominant_trait: String,
    pub created_at: DateTime<Utc>,
}

/// A profile as seen by one teacher, through a subject link.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LinkedStudentRow {
    pub student_id: String,
    pub name: String,
    pub email: Option<String>,
    pub subject: String,
    pub academic_year: String,
    pub year_level: String,
    pub trait_scores: Value,
    pub dominant_trait: String,
    pub created_at: DateTime<Utc>,
}

/// Scored columns shared by both row shapes.
pub trait ScoredRow {
    fn student_id(&self) -> &str;
    fn trait_scores(&self) -> &Value;
    fn dominant_label(&self) -> &str;

    /// Stored totals. Unreadable JSON is logged and read as all zeros.
    fn totals(&self) -> TraitMap<u32> {
        match serde_json::from_value(self.trait_scores().clone()) {
            Ok(totals) => totals,
            Err(e) => {
                warn!("Unreadable trait scores for student {}: {e}", self.student_id());
                TraitMap::default()
            }
        }
    }

    fn dominant(&self) -> DominantTraits {
        DominantTraits::parse_lenient(self.dominant_label())
    }
}

impl ScoredRow for StudentProfileRow {
    fn student_id(&self) -> &str {
        &self.student_id
    }
    fn trait_scores(&self) -> &Value {
        &self.trait_scores
    }
    fn dominant_label(&self) -> &str {
        &self.dominant_trait
    }
}

impl ScoredRow for LinkedStudentRow {
    fn student_id(&self) -> &str {
        &self.student_id
    }
    fn trait_scores(&self) -> &Value {
        &self.trait_scores
    }
    fn dominant_label(&self) -> &str {
        &self.dominant_trait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::traits::Trait;
    use serde_json::json;

    fn row(scores: Value, dominant: &str) -> StudentProfileRow {
        StudentProfileRow {
            student_id: "S1".to_string(),
            academic_year: "2024-2025".to_string(),
            name: "Ana".to_string(),
            year_level: "10".to_string(),
            trait_scores: scores,
            dominant_trait: dominant.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_from_stored_json() {
        let r = row(
            json!({"Extraversion": 35, "Neuroticism": 22, "Agreeableness": 40,
                   "Conscientiousness": 31, "Openness": 40}),
            "Agreeableness & Openness",
        );
        let totals = r.totals();
        assert_eq!(totals[Trait::Extraversion], 35);
        assert_eq!(totals[Trait::Openness], 40);
        assert_eq!(
            r.dominant().traits(),
            &[Trait::Agreeableness, Trait::Openness]
        );
    }

    #[test]
    fn test_unreadable_scores_read_as_zero() {
        let r = row(json!("not a map"), "Openness");
        assert_eq!(r.totals(), TraitMap::default());
    }
}
