use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assess::{load_class, SubjectQuery};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::scoring::aggregate::{observed_counts, Band};
use crate::scoring::dominant::DominantTraits;
use crate::scoring::traits::TraitMap;
use crate::state::AppState;
use crate::store::insights;

#[derive(Serialize)]
pub struct DashboardStats {
    pub total_students: usize,
    pub distinct_traits: usize,
    pub most_common_trait: Option<DominantTraits>,
    pub last_profile_at: Option<DateTime<Utc>>,
}

/// GET /dashboard/stats?subject=
pub async fn handle_dashboard_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    let teacher_id = user.require_teacher()?;
    let (rows, aggregate) = load_class(&state, teacher_id, &query.filter()).await?;

    Ok(Json(DashboardStats {
        total_students: rows.len(),
        distinct_traits: aggregate
            .as_ref()
            .map(|p| observed_counts(&p.dominant_tally).len())
            .unwrap_or(0),
        most_common_trait: aggregate.map(|p| p.most_common),
        last_profile_at: rows.iter().map(|r| r.created_at).max(),
    }))
}

#[derive(Serialize)]
pub struct ClassProfileSummary {
    pub respondents: usize,
    pub average_scores: TraitMap<f64>,
    /// Rounded averages; the highest and lowest traits are resolved over these.
    pub class_scores: TraitMap<u32>,
    pub bands: TraitMap<Band>,
    pub highest_trait: DominantTraits,
    pub lowest_trait: DominantTraits,
    pub most_common_trait: DominantTraits,
}

/// GET /class-profile-summary?subject=
pub async fn handle_class_profile_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<ClassProfileSummary>, AppError> {
    let teacher_id = user.require_teacher()?;
    let (_, aggregate) = load_class(&state, teacher_id, &query.filter()).await?;
    let profile = aggregate.ok_or_else(|| AppError::NotFound("No student data found".to_string()))?;

    Ok(Json(ClassProfileSummary {
        respondents: profile.respondents,
        highest_trait: profile.dominant,
        lowest_trait: profile.lowest,
        average_scores: profile.mean_scores,
        class_scores: profile.class_scores,
        bands: profile.bands,
        most_common_trait: profile.most_common,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Key findings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct InsightsResponse {
    pub subject: String,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// False when the fallback payload was returned and nothing was stored.
    pub stored: bool,
}

/// GET /insights?subject=
pub async fn handle_get_insights(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<InsightsResponse>, AppError> {
    let teacher_id = user.require_teacher()?;
    let subject = query.insight_subject();

    let response = match insights::latest(&state.db, teacher_id, &subject).await? {
        Some(row) => InsightsResponse {
            subject,
            key_findings: row.key_findings.0,
            recommendations: row.recommendations.0,
            last_updated: Some(row.created_at),
            stored: true,
        },
        None => InsightsResponse {
            subject,
            key_findings: Vec::new(),
            recommendations: Vec::new(),
            last_updated: None,
            stored: false,
        },
    };
    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct GenerateInsightsRequest {
    pub subject: Option<String>,
}

/// POST /insights/generate
pub async fn handle_generate_insights(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateInsightsRequest>,
) -> Result<Json<InsightsResponse>, AppError> {
    let teacher_id = user.require_teacher()?;
    let query = SubjectQuery { subject: req.subject };
    let subject = query.insight_subject();

    let (_, aggregate) = load_class(&state, teacher_id, &query.filter()).await?;
    let profile = aggregate.ok_or_else(|| AppError::NotFound("No student data found".to_string()))?;

    let reply = state.recommendations.key_findings(&profile).await;
    let findings = reply.payload;

    if reply.used_fallback {
        warn!("Key findings for teacher {teacher_id} ({subject}) fell back; not storing");
        return Ok(Json(InsightsResponse {
            subject,
            key_findings: findings.key_findings,
            recommendations: findings.recommendations,
            last_updated: None,
            stored: false,
        }));
    }

    let row = insights::insert(
        &state.db,
        teacher_id,
        &subject,
        &findings.key_findings,
        &findings.recommendations,
    )
    .await?;
    info!("Stored key findings {} for teacher {teacher_id} ({subject})", row.id);

    Ok(Json(InsightsResponse {
        subject,
        key_findings: row.key_findings.0,
        recommendations: row.recommendations.0,
        last_updated: Some(row.created_at),
        stored: true,
    }))
}
