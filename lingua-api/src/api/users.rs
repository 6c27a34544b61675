//! User account endpoints: registration, login, profile

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use lingua_common::auth::{hash_password, issue_token, verify_password};
use lingua_common::db;
use lingua_common::models::user::{EnglishLevel, User, UserResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::CurrentUser;
use super::AppState;
use crate::error::{ApiError, ApiResult};

const MIN_PASSWORD_CHARS: usize = 8;
const MIN_DAILY_GOAL_MINUTES: i64 = 5;
const MAX_DAILY_GOAL_MINUTES: i64 = 180;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub current_level: Option<EnglishLevel>,
    pub learning_goals: Option<Vec<String>>,
    pub preferred_study_time: Option<String>,
    pub daily_goal_minutes: Option<i64>,
    pub notifications_enabled: Option<bool>,
    pub voice_preference: Option<String>,
}

/// POST /api/v1/users/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    if db::users::load_user_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::BadRequest("Email is already registered".to_string()));
    }

    let password_hash = hash_password(&request.password)?;
    let user = User::new(email, request.name.trim().to_string(), password_hash);
    db::users::save_user(&state.db, &user).await?;

    let token = issue_token(
        &user.id,
        &state.settings.jwt_secret,
        state.settings.token_lifetime_hours,
    )?;
    tracing::info!(user_id = %user.id, "Registered new user");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "user": UserResponse::from(&user),
        })),
    ))
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let email = request.email.trim().to_lowercase();
    let user = db::users::load_user_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = issue_token(
        &user.id,
        &state.settings.jwt_secret,
        state.settings.token_lifetime_hours,
    )?;
    tracing::debug!(user_id = %user.id, "User logged in");

    Ok(Json(json!({
        "token": token,
        "user": UserResponse::from(&user),
    })))
}

/// GET /api/v1/users/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// PUT /api/v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
        }
        user.name = name;
    }
    if let Some(level) = request.current_level {
        user.current_level = level;
    }
    if let Some(goals) = request.learning_goals {
        user.profile.learning_goals = goals;
    }
    if let Some(study_time) = request.preferred_study_time {
        user.profile.preferred_study_time = study_time;
    }
    if let Some(minutes) = request.daily_goal_minutes {
        if !(MIN_DAILY_GOAL_MINUTES..=MAX_DAILY_GOAL_MINUTES).contains(&minutes) {
            return Err(ApiError::BadRequest(format!(
                "daily_goal_minutes must be {}..={}",
                MIN_DAILY_GOAL_MINUTES, MAX_DAILY_GOAL_MINUTES
            )));
        }
        user.profile.daily_goal_minutes = minutes;
    }
    if let Some(enabled) = request.notifications_enabled {
        user.profile.notifications_enabled = enabled;
    }
    if let Some(voice) = request.voice_preference {
        user.profile.voice_preference = voice;
    }

    user.updated_at = chrono::Utc::now();
    db::users::save_user(&state.db, &user).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/v1/users/{id} — users can only read themselves
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    if id != current.id {
        return Err(ApiError::Forbidden("Cannot access another user".to_string()));
    }
    let user = db::users::load_user_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))?;
    Ok(Json(UserResponse::from(&user)))
}
