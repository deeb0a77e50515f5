//! Psychometric batch import: score every row and insert new profiles in one
//! transaction, skipping students already profiled for the academic year.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::upload::UploadKind;
use crate::scoring::dominant::{resolve, DominantTraits};
use crate::scoring::scorer::score;
use crate::scoring::traits::TraitMap;
use crate::store::{files, profiles};
use crate::survey::SurveyResponse;

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub skipped_students: Vec<String>,
}

/// Which rows of a batch become new profiles.
#[derive(Debug)]
pub struct ImportPlan<'a> {
    pub to_insert: Vec<&'a SurveyResponse>,
    pub skipped_students: Vec<String>,
}

/// Skips students already profiled for the year and repeats of a student
/// within the batch; the first row for a student wins.
pub fn plan_import<'a>(responses: &'a [SurveyResponse], existing: &HashSet<String>) -> ImportPlan<'a> {
    let mut seen = HashSet::new();
    let mut plan = ImportPlan {
        to_insert: Vec::new(),
        skipped_students: Vec::new(),
    };
    for response in responses {
        let id = response.student_id.as_str();
        if existing.contains(id) || !seen.insert(id) {
            plan.skipped_students.push(response.student_id.clone());
        } else {
            plan.to_insert.push(response);
        }
    }
    plan
}

/// Totals and dominant label for one decoded row.
pub fn score_row(response: &SurveyResponse) -> (TraitMap<u32>, DominantTraits) {
    let totals = score(&response.answers);
    let dominant = resolve(&totals);
    (totals, dominant)
}

pub async fn import(
    pool: &PgPool,
    admin_id: Uuid,
    file_name: &str,
    academic_year: &str,
    responses: &[SurveyResponse],
) -> Result<ImportSummary, sqlx::Error> {
    let ids: Vec<String> = responses.iter().map(|r| r.student_id.clone()).collect();

    let mut tx = pool.begin().await?;
    let existing = profiles::existing_ids(&mut *tx, academic_year, &ids).await?;
    let existing: HashSet<String> = existing.into_iter().collect();
    let plan = plan_import(responses, &existing);

    for response in &plan.to_insert {
        let (totals, dominant) = score_row(response);
        profiles::insert(
            &mut *tx,
            profiles::NewProfile {
                student_id: &response.student_id,
                academic_year,
                name: &response.name,
                year_level: &response.year_level,
                trait_scores: serde_json::to_value(totals).unwrap_or_default(),
                dominant_trait: dominant.to_string(),
            },
        )
        .await?;
    }
    files::record(
        &mut *tx,
        admin_id,
        file_name,
        UploadKind::Psychometric,
        Some(academic_year),
        responses.len(),
    )
    .await?;
    tx.commit().await?;

    let summary = ImportSummary {
        inserted: plan.to_insert.len(),
        skipped: plan.skipped_students.len(),
        skipped_students: plan.skipped_students,
    };
    info!(
        "Psychometric import {file_name} ({academic_year}): {} inserted, {} skipped",
        summary.inserted, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::items::ITEM_COUNT;
    use crate::scoring::traits::Trait;
    use crate::survey::decoder::{decode_responses, ColumnScheme};

    fn batch(ids: &[&str]) -> Vec<SurveyResponse> {
        let header = ColumnScheme::Prefixed.expected_columns().join(",");
        let answers = vec!["3"; ITEM_COUNT].join(",");
        let rows: String = ids
            .iter()
            .enumerate()
            .map(|(i, id)| format!("{id},Student {i},10,{answers}\n"))
            .collect();
        decode_responses(format!("{header}\n{rows}").as_bytes(), ColumnScheme::Prefixed).unwrap()
    }

    #[test]
    fn test_plan_skips_existing_profiles() {
        let responses = batch(&["S1", "S2", "S3"]);
        let existing = HashSet::from(["S2".to_string()]);
        let plan = plan_import(&responses, &existing);
        let inserted: Vec<&str> = plan.to_insert.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(inserted, vec!["S1", "S3"]);
        assert_eq!(plan.skipped_students, vec!["S2"]);
    }

    #[test]
    fn test_plan_keeps_first_row_for_repeated_student() {
        let responses = batch(&["S1", "S1", "S2"]);
        let plan = plan_import(&responses, &HashSet::new());
        assert_eq!(plan.to_insert.len(), 2);
        assert_eq!(plan.to_insert[0].name, "Student 0");
        assert_eq!(plan.skipped_students, vec!["S1"]);
    }

    #[test]
    fn test_plan_empty_batch() {
        let plan = plan_import(&[], &HashSet::from(["S1".to_string()]));
        assert!(plan.to_insert.is_empty());
        assert!(plan.skipped_students.is_empty());
    }

    #[test]
    fn test_score_row_from_prefixed_batch() {
        let header = ColumnScheme::Prefixed.expected_columns().join(",");
        let answers = vec!["3"; ITEM_COUNT].join(",");
        let csv = format!("{header}\nS1,Ana Cruz,10,{answers}\n");
        let responses = decode_responses(csv.as_bytes(), ColumnScheme::Prefixed).unwrap();

        let (totals, dominant) = score_row(&responses[0]);
        assert!(totals.values().all(|v| *v == 30));
        assert_eq!(dominant.traits(), &Trait::ALL);
        assert_eq!(
            dominant.to_string(),
            "Extraversion & Neuroticism & Agreeableness & Conscientiousness & Openness"
        );
        assert_eq!(
            serde_json::to_value(totals).unwrap(),
            serde_json::json!({
                "Extraversion": 30, "Neuroticism": 30, "Agreeableness": 30,
                "Conscientiousness": 30, "Openness": 30
            })
        );
    }

    #[tokio::test]
    #[ignore = "needs TEST_DATABASE_URL pointing at a scratch Postgres database"]
    async fn test_import_and_teacher_scope_against_database() {
        use crate::auth::Role;
        use crate::store::links;
        use crate::store::profiles::LinkFilter;
        use crate::store::users;
        use crate::survey::roster::RosterEntry;

        let url = std::env::var("TEST_DATABASE_URL").unwrap();
        let pool = crate::db::create_pool(&url).await.unwrap();
        let suffix = Uuid::new_v4().simple().to_string();
        let admin = users::insert(&pool, "Admin", &format!("admin-{suffix}@school.test"), "x", Role::Admin)
            .await
            .unwrap();
        let teacher = users::insert(&pool, "Tess", &format!("tess-{suffix}@school.test"), "x", Role::Teacher)
            .await
            .unwrap();
        let year = format!("AY-{suffix}");
        let (first_id, second_id) = (format!("A-{suffix}"), format!("B-{suffix}"));

        let summary = import(&pool, admin.id, "first.csv", &year, &batch(&[first_id.as_str()]))
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);

        let rerun = batch(&[first_id.as_str(), second_id.as_str(), second_id.as_str()]);
        let summary = import(&pool, admin.id, "second.csv", &year, &rerun).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped_students, vec![first_id.clone(), second_id.clone()]);

        let entry = RosterEntry {
            student_id: second_id.clone(),
            name: "Student 1".to_string(),
            subject: "Math".to_string(),
            academic_year: year.clone(),
            year_level: "10".to_string(),
        };
        links::link(&pool, teacher.id, &entry).await.unwrap();

        let rows = profiles::for_teacher(&pool, teacher.id, &LinkFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, second_id);

        let science = LinkFilter {
            subject: Some("Science".to_string()),
            academic_year: None,
        };
        let rows = profiles::for_teacher(&pool, teacher.id, &science).await.unwrap();
        assert!(rows.is_empty());
    }
}
