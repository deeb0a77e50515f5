use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assess::normalize_filter;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::profile::{LinkedStudentRow, ScoredRow};
use crate::models::upload::UploadKind;
use crate::scoring::traits::Trait;
use crate::state::AppState;
use crate::store::links::{self, LinkKey};
use crate::store::profiles::{self, LinkFilter};
use crate::store::files;
use crate::survey::decoder::{decode_detected, ColumnScheme};
use crate::survey::roster::decode_roster;
use crate::uploads::read_upload_form;

#[derive(Serialize)]
pub struct MasterlistResult {
    pub matched: usize,
    pub newly_linked: usize,
    pub unmatched: usize,
    pub unmatched_students: Vec<String>,
}

/// POST /teacher/upload-masterlist
pub async fn handle_upload_masterlist(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<MasterlistResult>, AppError> {
    let teacher_id = user.require_teacher()?;
    let form = read_upload_form(multipart).await?;
    let (file_name, data) = form.require_file()?;
    let entries = decode_roster(data)?;

    let mut result = MasterlistResult {
        matched: 0,
        newly_linked: 0,
        unmatched: 0,
        unmatched_students: Vec::new(),
    };

    let mut tx = state.db.begin().await?;
    for entry in &entries {
        if profiles::has_any(&mut *tx, &entry.student_id).await? {
            result.matched += 1;
            if links::link(&mut *tx, teacher_id, entry).await? {
                result.newly_linked += 1;
            }
        } else {
            result.unmatched += 1;
            result.unmatched_students.push(entry.student_id.clone());
        }
    }
    files::record(&mut *tx, teacher_id, &file_name, UploadKind::Masterlist, None, entries.len()).await?;
    tx.commit().await?;

    info!(
        "Master list {file_name} from teacher {teacher_id}: {} matched, {} unmatched",
        result.matched, result.unmatched
    );
    Ok(Json(result))
}

#[derive(Serialize)]
pub struct SurveyUploadResult {
    pub file_name: String,
    pub layout: &'static str,
    pub respondents: usize,
    /// File lines of rows dropped for a blank student id.
    pub skipped_lines: Vec<u64>,
}

/// POST /teacher/upload-survey
pub async fn handle_upload_survey(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<SurveyUploadResult>, AppError> {
    let teacher_id = user.require_teacher()?;
    let form = read_upload_form(multipart).await?;
    let (file_name, data) = form.require_file()?;

    // Rejected files never replace the previous upload.
    let (scheme, decoded) = decode_detected(data)?;
    state.uploads.save(teacher_id, data).await?;
    let respondents = decoded.responses.len();
    files::record(&state.db, teacher_id, &file_name, UploadKind::Survey, None, respondents).await?;

    Ok(Json(SurveyUploadResult {
        file_name,
        layout: match scheme {
            ColumnScheme::Numbered => "numbered",
            ColumnScheme::Prefixed => "prefixed",
        },
        respondents,
        skipped_lines: decoded.blank_id_lines,
    }))
}

#[derive(Deserialize)]
pub struct StudentListQuery {
    pub subject: Option<String>,
    pub academic_year: Option<String>,
}

impl StudentListQuery {
    fn filter(&self) -> LinkFilter {
        LinkFilter {
            subject: normalize_filter(self.subject.as_deref()),
            academic_year: normalize_filter(self.academic_year.as_deref()),
        }
    }
}

/// GET /teacher/students?subject=
pub async fn handle_list_students(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<LinkedStudentRow>>, AppError> {
    let teacher_id = user.require_teacher()?;
    let students = profiles::linked_students(&state.db, teacher_id, &query.filter()).await?;
    Ok(Json(students))
}

/// GET /teacher/subjects
pub async fn handle_list_subjects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<String>>, AppError> {
    let teacher_id = user.require_teacher()?;
    Ok(Json(links::subjects(&state.db, teacher_id).await?))
}

#[derive(Deserialize)]
pub struct UpdateStudentRequest {
    pub subject: Option<String>,
    pub academic_year: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// PUT /teacher/students/:id
pub async fn handle_update_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(student_id): Path<String>,
    Json(req): Json<UpdateStudentRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let teacher_id = user.require_teacher()?;
    let key = LinkKey {
        teacher_id,
        student_id: &student_id,
        subject: required(&req.subject, "subject")?,
        academic_year: required(&req.academic_year, "academic_year")?,
    };
    let name = required(&req.name, "name")?;
    let email = required(&req.email, "email")?;

    if links::update_contact(&state.db, key, name, email).await? == 0 {
        return Err(AppError::NotFound(format!(
            "Student {student_id} is not on that roster"
        )));
    }
    Ok(Json(MessageResponse {
        message: "Student information updated.".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct RemoveStudentQuery {
    pub subject: Option<String>,
    pub academic_year: Option<String>,
}

/// DELETE /teacher/students/:id?subject=&academic_year=
pub async fn handle_remove_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(student_id): Path<String>,
    Query(query): Query<RemoveStudentQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let teacher_id = user.require_teacher()?;
    let key = LinkKey {
        teacher_id,
        student_id: &student_id,
        subject: required(&query.subject, "subject")?,
        academic_year: required(&query.academic_year, "academic_year")?,
    };

    if links::unlink(&state.db, key).await? == 0 {
        return Err(AppError::NotFound(format!(
            "Student {student_id} is not on that roster"
        )));
    }
    Ok(Json(MessageResponse {
        message: "Student removed from your list.".to_string(),
    }))
}

#[derive(Serialize)]
pub struct ClusterMember {
    pub id: String,
    pub name: String,
}

/// GET /teacher/clustered-students?subject=&academic_year=
/// A tied student appears under each of their dominant traits.
pub async fn handle_clustered_students(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<BTreeMap<Trait, Vec<ClusterMember>>>, AppError> {
    let teacher_id = user.require_teacher()?;
    let rows = profiles::for_teacher(&state.db, teacher_id, &query.filter()).await?;

    let mut clusters: BTreeMap<Trait, Vec<ClusterMember>> = BTreeMap::new();
    for row in &rows {
        for &t in row.dominant().traits() {
            clusters.entry(t).or_default().push(ClusterMember {
                id: row.student_id.clone(),
                name: row.name.clone(),
            });
        }
    }
    Ok(Json(clusters))
}

#[derive(Deserialize)]
pub struct InterventionQuery {
    #[serde(rename = "trait")]
    pub trait_name: Option<String>,
}

#[derive(Serialize)]
pub struct InterventionResponse {
    #[serde(rename = "trait")]
    pub trait_name: Trait,
    pub recommendation: String,
    pub used_fallback: bool,
}

/// GET /teacher/trait-intervention?trait=
pub async fn handle_trait_intervention(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InterventionQuery>,
) -> Result<Json<InterventionResponse>, AppError> {
    user.require_teacher()?;
    let trait_name = required(&query.trait_name, "trait")?
        .parse::<Trait>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reply = state.recommendations.trait_intervention(trait_name.name()).await;
    Ok(Json(InterventionResponse {
        trait_name,
        recommendation: reply.payload,
        used_fallback: reply.used_fallback,
    }))
}
