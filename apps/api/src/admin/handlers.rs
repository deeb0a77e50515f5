use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::psychometric::{import, ImportSummary};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::profile::StudentProfileRow;
use crate::models::upload::UploadedFileRow;
use crate::models::user::UserSummaryRow;
use crate::state::AppState;
use crate::store::{files, links, profiles, users};
use crate::survey::decoder::{decode_responses, ColumnScheme};
use crate::uploads::read_upload_form;

const ACADEMIC_YEAR_FIELD: &str = "academic_year";

/// GET /admin/processed-files
pub async fn handle_processed_files(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<UploadedFileRow>>, AppError> {
    user.require_admin()?;
    Ok(Json(files::list(&state.db).await?))
}

/// GET /admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<UserSummaryRow>>, AppError> {
    user.require_admin()?;
    Ok(Json(users::list_with_upload_counts(&state.db).await?))
}

#[derive(Serialize)]
pub struct AdminStats {
    pub total_students: i64,
    pub profiles_this_term: i64,
    pub files_uploaded: i64,
    pub active_uploaders: i64,
    pub last_upload: Option<DateTime<Utc>>,
}

/// GET /admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AdminStats>, AppError> {
    user.require_admin()?;
    let uploads = files::totals(&state.db).await?;
    Ok(Json(AdminStats {
        total_students: links::count_linked_students(&state.db).await?,
        profiles_this_term: profiles::count_created_since(&state.db, state.config.term_start).await?,
        files_uploaded: uploads.files,
        active_uploaders: uploads.active_uploaders,
        last_upload: uploads.last_upload,
    }))
}

#[derive(Serialize)]
pub struct LabelCount {
    #[serde(rename = "trait")]
    pub label: String,
    pub count: i64,
}

/// GET /admin/trait-distribution
/// Grouped by the stored label, so a tie is its own bucket.
pub async fn handle_trait_distribution(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<LabelCount>>, AppError> {
    user.require_admin()?;
    let counts = profiles::dominant_label_counts(&state.db)
        .await?
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    Ok(Json(counts))
}

/// GET /admin/student-profiles
pub async fn handle_student_profiles(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<StudentProfileRow>>, AppError> {
    user.require_admin()?;
    Ok(Json(profiles::list_all(&state.db).await?))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub year_level: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// PUT /admin/students/:id
pub async fn handle_update_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(student_id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require_admin()?;
    let name = req.name.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let year_level = req.year_level.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let (Some(name), Some(year_level)) = (name, year_level) else {
        return Err(AppError::Validation("Missing name or year level".to_string()));
    };

    if profiles::update_identity(&state.db, &student_id, name, year_level).await? == 0 {
        return Err(AppError::NotFound(format!("No profile for student {student_id}")));
    }
    Ok(Json(MessageResponse {
        message: "Student profile updated successfully".to_string(),
    }))
}

/// DELETE /admin/students/:id
pub async fn handle_delete_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(student_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require_admin()?;
    if profiles::delete_student(&state.db, &student_id).await? == 0 {
        return Err(AppError::NotFound(format!("No profile for student {student_id}")));
    }
    Ok(Json(MessageResponse {
        message: "Student profile deleted successfully".to_string(),
    }))
}

/// POST /admin/upload-psychometric
pub async fn handle_upload_psychometric(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let admin_id = user.require_admin()?;
    let form = read_upload_form(multipart).await?;
    let (file_name, data) = form.require_file()?;
    let academic_year = form
        .field(ACADEMIC_YEAR_FIELD)
        .ok_or_else(|| AppError::Validation("academic_year is required".to_string()))?;

    let responses = decode_responses(data, ColumnScheme::Prefixed)?;
    let summary = import(&state.db, admin_id, &file_name, academic_year, &responses).await?;
    Ok(Json(summary))
}
