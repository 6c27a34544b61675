//! Vocabulary endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use lingua_common::db;
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::CurrentUser;
use super::{into_api_response, with_action, AppState};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WordListQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/vocabulary/next-activity
pub async fn next_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("vocabulary_exercise", user, json!({}))
        .await;
    into_api_response(result)
}

/// POST /api/v1/vocabulary/submit-answer
pub async fn submit_answer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("vocabulary_exercise", user, with_action(body, "submit_answer"))
        .await;
    into_api_response(result)
}

/// GET /api/v1/vocabulary/progress
pub async fn progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("vocabulary_exercise", user, json!({"action": "progress"}))
        .await;
    into_api_response(result)
}

/// GET /api/v1/vocabulary/review-list?limit=
pub async fn review_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReviewListQuery>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle(
            "vocabulary_exercise",
            user,
            json!({"action": "review_list", "limit": query.limit}),
        )
        .await;
    into_api_response(result)
}

/// GET /api/v1/vocabulary/words — catalog listing with filters
pub async fn words(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<WordListQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let words = db::vocabulary::list_words(
        &state.db,
        query.category.as_deref(),
        query.difficulty.as_deref(),
        limit,
        offset,
    )
    .await?;
    let total = db::vocabulary::count_words(&state.db).await?;
    Ok(Json(json!({
        "words": words,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

/// GET /api/v1/vocabulary/word/{id}
pub async fn word(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let word = db::vocabulary::load_word(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Word {}", id)))?;
    Ok(Json(json!({"word": word})))
}
