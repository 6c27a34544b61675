//! Assessment endpoints

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use super::auth::CurrentUser;
use super::{into_api_response, with_action, AppState};
use crate::error::ApiResult;

/// POST /api/v1/assessment/start
///
/// `{"assessment_type": "initial" | "continuous"}`; defaults to the
/// initial placement when the user has never been assessed.
pub async fn start(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let requested = body
        .get("assessment_type")
        .and_then(Value::as_str)
        .unwrap_or(if user.initial_assessment_completed {
            "continuous"
        } else {
            "initial"
        });
    let request_type = if requested == "continuous" {
        "assessment_continuous"
    } else {
        "assessment_initial"
    };

    let result = state.orchestrator.handle(request_type, user, body).await;
    into_api_response(result)
}

/// POST /api/v1/assessment/submit — one step of the initial placement
pub async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("assessment_initial", user, with_action(body, "submit"))
        .await;
    into_api_response(result)
}

/// GET /api/v1/assessment/status
pub async fn status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let continuous_due = user.sessions_since_last_assessment
        >= state.settings.continuous_assessment_frequency;
    Ok(Json(json!({
        "initial_assessment_completed": user.initial_assessment_completed,
        "last_assessment_date": user.last_assessment_date,
        "sessions_since_last_assessment": user.sessions_since_last_assessment,
        "continuous_assessment_due": continuous_due,
        "current_level": user.current_level,
    })))
}
