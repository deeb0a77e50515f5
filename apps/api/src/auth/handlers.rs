use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthUser, Role};
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;
use crate::store::users;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: AuthUser,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// POST /auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserRow>), AppError> {
    let (Some(name), Some(email), Some(password)) = (
        required(&req.name),
        required(&req.email),
        required(&req.password),
    ) else {
        return Err(AppError::Validation(
            "name, email and password are required".to_string(),
        ));
    };

    let role = match required(&req.role) {
        Some(role) => role.parse::<Role>()?,
        None => Role::Teacher,
    };
    if role == Role::Admin {
        match &caller {
            Some(user) => {
                user.require_admin()?;
            }
            None => {
                return Err(AppError::Forbidden(
                    "Only an admin can create admin accounts".to_string(),
                ))
            }
        }
    }

    if users::find_by_email(&state.db, email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(password).await?;
    let user = users::insert(&state.db, name, email, &password_hash, role)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                AppError::Conflict("User already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    info!("Registered {} account {}", user.role, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (Some(email), Some(password)) = (required(&req.email), required(&req.password)) else {
        return Err(AppError::Validation("Missing credentials".to_string()));
    };

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = users::find_by_email(&state.db, email)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(password, &user.password_hash).await? {
        return Err(invalid());
    }

    let role: Role = user.role.parse()?;
    let access_token = state.tokens.issue(user.id, role, &user.name)?;

    Ok(Json(LoginResponse {
        access_token,
        user: AuthUser {
            id: user.id,
            name: user.name,
            role,
        },
    }))
}

/// GET /auth/me
pub async fn handle_me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}
