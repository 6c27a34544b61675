//! Grammar endpoints

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
pub struct ExercisesQuery {
    pub rule_id: Option<String>,
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RuleListQuery {
    pub difficulty: Option<String>,
}

/// GET /api/v1/grammar/next-lesson
pub async fn next_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state.orchestrator.handle("grammar_lesson", user, json!({})).await;
    into_api_response(result)
}

/// POST /api/v1/grammar/submit-explanation
pub async fn submit_explanation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("grammar_lesson", user, with_action(body, "submit_explanation"))
        .await;
    into_api_response(result)
}

/// GET /api/v1/grammar/exercises?rule_id=&count=
pub async fn exercises(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ExercisesQuery>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle(
            "grammar_exercise",
            user,
            json!({
                "action": "exercises",
                "rule_id": query.rule_id,
                "count": query.count,
            }),
        )
        .await;
    into_api_response(result)
}

/// POST /api/v1/grammar/submit-exercise
pub async fn submit_exercise(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("grammar_exercise", user, with_action(body, "submit_exercise"))
        .await;
    into_api_response(result)
}

/// GET /api/v1/grammar/progress
pub async fn progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("grammar_lesson", user, json!({"action": "progress"}))
        .await;
    into_api_response(result)
}

/// GET /api/v1/grammar/rules
pub async fn rules(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<RuleListQuery>,
) -> ApiResult<Json<Value>> {
    let rules = db::grammar::list_rules(&state.db, query.difficulty.as_deref()).await?;
    let total = rules.len();
    Ok(Json(json!({"rules": rules, "total": total})))
}

/// GET /api/v1/grammar/rule/{id}
pub async fn rule(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let rule = db::grammar::load_rule(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Grammar rule {}", id)))?;
    Ok(Json(json!({"rule": rule})))
}
