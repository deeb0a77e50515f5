pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::admin::handlers as admin;
use crate::assess::{dashboard, handlers as assess};
use crate::auth::handlers as auth;
use crate::state::AppState;
use crate::teacher::handlers as teacher;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/register", post(auth::handle_register))
        .route("/auth/login", post(auth::handle_login))
        .route("/auth/me", get(auth::handle_me))
        // Teacher rosters and uploads
        .route(
            "/teacher/upload-masterlist",
            post(teacher::handle_upload_masterlist),
        )
        .route("/teacher/upload-survey", post(teacher::handle_upload_survey))
        .route("/teacher/students", get(teacher::handle_list_students))
        .route(
            "/teacher/students/:id",
            put(teacher::handle_update_student).delete(teacher::handle_remove_student),
        )
        .route("/teacher/subjects", get(teacher::handle_list_subjects))
        .route(
            "/teacher/clustered-students",
            get(teacher::handle_clustered_students),
        )
        .route(
            "/teacher/trait-intervention",
            get(teacher::handle_trait_intervention),
        )
        // Assessment
        .route("/assess/individual", get(assess::handle_individual))
        .route(
            "/assess/individual-insights",
            get(assess::handle_individual_insights),
        )
        .route(
            "/assess/recommendations",
            get(assess::handle_student_recommendations),
        )
        .route(
            "/assess/recommendation",
            post(assess::handle_class_recommendation),
        )
        .route("/assess/all", get(assess::handle_assess_all))
        .route("/assess/ocean-averages", get(assess::handle_ocean_averages))
        .route(
            "/assess/dominant-distribution",
            get(assess::handle_dominant_distribution),
        )
        // Dashboard and insights
        .route("/dashboard/stats", get(dashboard::handle_dashboard_stats))
        .route(
            "/class-profile-summary",
            get(dashboard::handle_class_profile_summary),
        )
        .route("/insights", get(dashboard::handle_get_insights))
        .route("/insights/generate", post(dashboard::handle_generate_insights))
        // Admin
        .route("/admin/processed-files", get(admin::handle_processed_files))
        .route("/admin/users", get(admin::handle_list_users))
        .route("/admin/stats", get(admin::handle_stats))
        .route(
            "/admin/trait-distribution",
            get(admin::handle_trait_distribution),
        )
        .route("/admin/student-profiles", get(admin::handle_student_profiles))
        .route(
            "/admin/students/:id",
            put(admin::handle_update_student).delete(admin::handle_delete_student),
        )
        .route(
            "/admin/upload-psychometric",
            post(admin::handle_upload_psychometric),
        )
        .with_state(state)
}
