//! Progress and scheduling endpoints

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use super::auth::CurrentUser;
use super::{into_api_response, with_action, AppState};
use crate::error::ApiResult;

/// GET /api/v1/progress/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state.orchestrator.handle("get_progress", user, json!({})).await;
    into_api_response(result)
}

/// GET /api/v1/progress/schedule/today
pub async fn schedule_today(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state.orchestrator.handle("get_schedule", user, json!({})).await;
    into_api_response(result)
}

/// GET /api/v1/progress/next-activity
pub async fn next_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("get_next_activity", user, json!({}))
        .await;
    into_api_response(result)
}

/// POST /api/v1/progress/update — manual post-activity bookkeeping
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("get_progress", user, with_action(body, "update"))
        .await;
    into_api_response(result)
}

/// GET /api/v1/progress/streak
pub async fn streak(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("get_progress", user, json!({"action": "streak"}))
        .await;
    into_api_response(result)
}

/// GET /api/v1/progress/weekly-report
pub async fn weekly_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("get_progress", user, json!({"action": "weekly_report"}))
        .await;
    into_api_response(result)
}
