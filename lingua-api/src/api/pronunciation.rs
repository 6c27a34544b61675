//! Pronunciation endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use lingua_common::db;
use serde_json::{json, Value};

use super::auth::CurrentUser;
use super::{into_api_response, with_action, AppState};
use crate::agents::pronunciation::guidance_for;
use crate::error::{ApiError, ApiResult};

/// GET /api/v1/pronunciation/next-exercise
pub async fn next_exercise(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("pronunciation_exercise", user, json!({}))
        .await;
    into_api_response(result)
}

/// POST /api/v1/pronunciation/submit-audio
pub async fn submit_audio(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle(
            "pronunciation_exercise",
            user,
            with_action(body, "submit_audio"),
        )
        .await;
    into_api_response(result)
}

/// GET /api/v1/pronunciation/progress
pub async fn progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("pronunciation_exercise", user, json!({"action": "progress"}))
        .await;
    into_api_response(result)
}

/// GET /api/v1/pronunciation/sounds
pub async fn sounds(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let sounds = db::pronunciation::list_sounds(&state.db).await?;
    let total = sounds.len();
    Ok(Json(json!({"sounds": sounds, "total": total})))
}

/// GET /api/v1/pronunciation/sound/{id}
pub async fn sound(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let sound = db::pronunciation::load_sound(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sound {}", id)))?;
    Ok(Json(json!({"sound": sound})))
}

/// GET /api/v1/pronunciation/guidance/{phoneme}
pub async fn guidance(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(phoneme): Path<String>,
) -> ApiResult<Json<Value>> {
    let sound = db::pronunciation::load_sound_by_phoneme(&state.db, &phoneme)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Phoneme {}", phoneme)))?;
    Ok(Json(json!({"guidance": guidance_for(&sound)})))
}
