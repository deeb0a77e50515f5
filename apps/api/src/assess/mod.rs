//! Teacher-facing assessment, dashboard and insight endpoints.

pub mod dashboard;
pub mod handlers;

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{ScoredRow, StudentProfileRow};
use crate::scoring::aggregate::AggregateProfile;
use crate::state::AppState;
use crate::store::profiles::{self, LinkFilter};

/// Subject under which "all subjects" insights are stored.
pub const GENERAL_SUBJECT: &str = "General";
const ALL_SUBJECTS: &str = "All";

/// `?subject=` on dashboard routes. `All` or empty means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct SubjectQuery {
    pub subject: Option<String>,
}

impl SubjectQuery {
    pub fn filter(&self) -> LinkFilter {
        LinkFilter {
            subject: normalize_filter(self.subject.as_deref()),
            academic_year: None,
        }
    }

    /// Key under which insights for this selection are stored.
    pub fn insight_subject(&self) -> String {
        normalize_filter(self.subject.as_deref())
            .filter(|s| s != GENERAL_SUBJECT)
            .unwrap_or_else(|| GENERAL_SUBJECT.to_string())
    }
}

pub fn normalize_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL_SUBJECTS))
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
pub struct StudentQuery {
    pub student_id: Option<String>,
}

impl StudentQuery {
    pub fn require(&self) -> Result<&str, AppError> {
        self.student_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("student_id is required".to_string()))
    }
}

/// The teacher's linked profiles under `filter`, and their aggregate (`None` when empty).
pub async fn load_class(
    state: &AppState,
    teacher_id: Uuid,
    filter: &LinkFilter,
) -> Result<(Vec<StudentProfileRow>, Option<AggregateProfile>), AppError> {
    let rows = profiles::for_teacher(&state.db, teacher_id, filter).await?;
    let aggregate = state
        .aggregator
        .aggregate_profiles(rows.iter().map(|row| (row.totals(), row.dominant())));
    Ok((rows, aggregate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(subject: Option<&str>) -> SubjectQuery {
        SubjectQuery {
            subject: subject.map(str::to_string),
        }
    }

    #[test]
    fn test_all_means_no_filter() {
        assert_eq!(query(None).filter().subject, None);
        assert_eq!(query(Some("All")).filter().subject, None);
        assert_eq!(query(Some("  ")).filter().subject, None);
        assert_eq!(query(Some("Math 10")).filter().subject.as_deref(), Some("Math 10"));
    }

    #[test]
    fn test_insight_subject() {
        assert_eq!(query(None).insight_subject(), "General");
        assert_eq!(query(Some("All")).insight_subject(), "General");
        assert_eq!(query(Some("General")).insight_subject(), "General");
        assert_eq!(query(Some("Science")).insight_subject(), "Science");
    }

    #[test]
    fn test_student_query_requires_id() {
        let missing = StudentQuery { student_id: Some(" ".to_string()) };
        assert!(matches!(missing.require(), Err(AppError::Validation(_))));
        let present = StudentQuery { student_id: Some("S1".to_string()) };
        assert_eq!(present.require().unwrap(), "S1");
    }
}
