
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assess::{load_class, StudentQuery, SubjectQuery};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::profile::ScoredRow;
use crate::recommendations::{Recommendation, TraitInsight};
use crate::scoring::aggregate::{observed_counts, Band};
use crate::scoring::dominant::{resolve, resolve_lowest, DominantTraits};
use crate::scoring::scorer::averages;
use crate::scoring::traits::{Trait, TraitMap};
use crate::state::AppState;
use crate::store::{links, profiles};
use crate::survey::decoder::decode_detected;
use crate::survey::SurveyResponse;

// ────────────────────────────────────────────────────────────────────────────
// Individual assessment
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct IndividualAssessment {
    pub student_id: String,
    pub name: String,
    pub academic_year: String,
    pub dominant_trait: DominantTraits,
    pub trait_scores: TraitMap<u32>,
    pub highest_traits: DominantTraits,
    pub lowest_traits: DominantTraits,
}

#[derive(Serialize)]
pub struct IndividualInsights {
    pub student_id: String,
    pub insights: TraitMap<TraitInsight>,
    pub used_fallback: bool,
}

#[derive(Serialize)]
pub struct StudentRecommendations {
    pub student_id: String,
    pub dominant_trait: DominantTraits,
    pub trait_averages: TraitMap<f64>,
    pub student_recommendation: String,
    pub teacher_strategy: String,
    pub used_fallback: bool,
}

/// 403 unless the student appears on one of the teacher's rosters.
async fn ensure_linked(state: &AppState, teacher_id: Uuid, student_id: &str) -> Result<(), AppError> {
    if links::is_linked(&state.db, teacher_id, student_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden("This student is not linked to you".to_string()))
    }
}

/// GET /assess/individual?student_id=
pub async fn handle_individual(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StudentQuery>,
) -> Result<Json<IndividualAssessment>, AppError> {
    let teacher_id = user.require_teacher()?;
    let student_id = query.require()?;
    ensure_linked(&state, teacher_id, student_id).await?;

    let profile = profiles::find_latest(&state.db, student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for student {student_id}")))?;

    let totals = profile.totals();
    Ok(Json(IndividualAssessment {
        dominant_trait: profile.dominant(),
        highest_traits: resolve(&totals),
        lowest_traits: resolve_lowest(&totals),
        trait_scores: totals,
        student_id: profile.student_id,
        name: profile.name,
        academic_year: profile.academic_year,
    }))
}

/// GET /assess/individual-insights?student_id=
pub async fn handle_individual_insights(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StudentQuery>,
) -> Result<Json<IndividualInsights>, AppError> {
    let teacher_id = user.require_teacher()?;
    let student_id = query.require()?;
    ensure_linked(&state, teacher_id, student_id).await?;

    let profile = profiles::find_latest(&state.db, student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for student {student_id}")))?;

    let reply = state.recommendations.trait_insights(&profile.totals()).await;
    Ok(Json(IndividualInsights {
        student_id: profile.student_id,
        insights: reply.payload,
        used_fallback: reply.used_fallback,
    }))
}

/// Decoded rows of the teacher's latest survey upload, or 400 when there is none.
async fn latest_upload(state: &AppState, teacher_id: Uuid) -> Result<Vec<SurveyResponse>, AppError> {
    let data = state
        .uploads
        .load(teacher_id)
        .await?
        .ok_or_else(|| AppError::Validation("No data available. Upload a CSV first.".to_string()))?;
    let (_, decoded) = decode_detected(&data)?;
    Ok(decoded.responses)
}

/// GET /assess/recommendations?student_id=
pub async fn handle_student_recommendations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StudentQuery>,
) -> Result<Json<StudentRecommendations>, AppError> {
    let teacher_id = user.require_teacher()?;
    let student_id = query.require()?;

    let responses = latest_upload(&state, teacher_id).await?;
    let response = responses
        .iter()
        .find(|r| r.student_id == student_id)
        .ok_or_else(|| AppError::NotFound(format!("Student ID {student_id} not found")))?;

    let trait_averages = averages(&response.answers);
    let dominant = resolve(&trait_averages);
    let reply = state
        .recommendations
        .student_recommendation(&dominant.to_string())
        .await;

    Ok(Json(StudentRecommendations {
        student_id: response.student_id.clone(),
        dominant_trait: dominant,
        trait_averages,
        student_recommendation: reply.payload.student,
        teacher_strategy: reply.payload.teacher,
        used_fallback: reply.used_fallback,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Class assessment
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ClassRecommendationRequest {
    pub dominant_trait: Option<String>,
}

#[derive(Serialize)]
pub struct ClassRecommendationResponse {
    pub dominant_trait: String,
    pub student_recommendation: String,
    pub teacher_strategy: String,
    pub used_fallback: bool,
}

/// POST /assess/recommendation
pub async fn handle_class_recommendation(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<ClassRecommendationRequest>,
) -> Result<Json<ClassRecommendationResponse>, AppError> {
    let label = req
        .dominant_trait
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Dominant trait not provided".to_string()))?;

    let reply = state.recommendations.class_recommendation(label).await;
    Ok(Json(ClassRecommendationResponse {
        dominant_trait: label.to_string(),
        student_recommendation: reply.payload.student,
        teacher_strategy: reply.payload.teacher,
        used_fallback: reply.used_fallback,
    }))
}

#[derive(Serialize)]
pub struct ClassAssessment {
    pub total_students: usize,
    /// Mean totals rounded half-to-even.
    pub trait_scores: Option<TraitMap<u32>>,
    pub bands: Option<TraitMap<Band>>,
    pub dominant_trait: Option<DominantTraits>,
    pub class_recommendation: Option<Recommendation>,
    pub used_fallback: bool,
}

/// GET /assess/all
pub async fn handle_assess_all(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ClassAssessment>, AppError> {
    let teacher_id = user.require_teacher()?;
    let responses = latest_upload(&state, teacher_id).await?;

    let Some(profile) = state.aggregator.aggregate(&responses) else {
        return Ok(Json(ClassAssessment {
            total_students: 0,
            trait_scores: None,
            bands: None,
            dominant_trait: None,
            class_recommendation: None,
            used_fallback: false,
        }));
    };

    info!(
        "Assessed {} students for teacher {teacher_id}: dominant {}",
        profile.respondents, profile.dominant
    );
    let reply = state
        .recommendations
        .class_recommendation(&profile.dominant.to_string())
        .await;

    Ok(Json(ClassAssessment {
        total_students: profile.respondents,
        trait_scores: Some(profile.class_scores),
        bands: Some(profile.bands),
        dominant_trait: Some(profile.dominant),
        class_recommendation: Some(reply.payload),
        used_fallback: reply.used_fallback,
    }))
}

#[derive(Serialize)]
pub struct TraitScore {
    #[serde(rename = "trait")]
    pub trait_name: Trait,
    pub score: f64,
}

#[derive(Serialize)]
pub struct TraitCount {
    #[serde(rename = "trait")]
    pub trait_name: Trait,
    pub count: u32,
}

/// GET /assess/ocean-averages?subject=
pub async fn handle_ocean_averages(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Vec<TraitScore>>, AppError> {
    let teacher_id = user.require_teacher()?;
    let (_, aggregate) = load_class(&state, teacher_id, &query.filter()).await?;

    let scores = aggregate
        .map(|profile| {
            profile
                .mean_scores
                .iter()
                .map(|(t, score)| TraitScore {
                    trait_name: t,
                    score: *score,
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(scores))
}

/// GET /assess/dominant-distribution?subject=
pub async fn handle_dominant_distribution(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Vec<TraitCount>>, AppError> {
    let teacher_id = user.require_teacher()?;
    let (_, aggregate) = load_class(&state, teacher_id, &query.filter()).await?;

    let counts = aggregate
        .map(|profile| {
            observed_counts(&profile.dominant_tally)
                .into_iter()
                .map(|(t, count)| TraitCount {
                    trait_name: t,
                    count,
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(counts))
}
