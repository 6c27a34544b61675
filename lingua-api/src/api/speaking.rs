//! Speaking session endpoints

use axum::{
    extract::{Query, State},
    response::Json,
};
use lingua_common::db;
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::CurrentUser;
use super::{into_api_response, with_action, AppState};
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct TopicListQuery {
    pub difficulty: Option<String>,
}

/// POST /api/v1/speaking/start-session
pub async fn start_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("speaking_session", user, with_action(body, "start"))
        .await;
    into_api_response(result)
}

/// POST /api/v1/speaking/turn
pub async fn turn(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("speaking_session", user, with_action(body, "turn"))
        .await;
    into_api_response(result)
}

/// POST /api/v1/speaking/end-session
pub async fn end_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let result = state
        .orchestrator
        .handle("speaking_session", user, with_action(body, "end"))
        .await;
    into_api_response(result)
}

/// GET /api/v1/speaking/active-session
pub async fn active_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let session = db::sessions::load_active_session(&state.db, &user.id).await?;
    Ok(Json(json!({"active": session.is_some(), "session": session})))
}

/// GET /api/v1/speaking/topics
pub async fn topics(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<TopicListQuery>,
) -> ApiResult<Json<Value>> {
    let topics = db::sessions::list_topics(&state.db, query.difficulty.as_deref()).await?;
    let total = topics.len();
    Ok(Json(json!({"topics": topics, "total": total})))
}

/// GET /api/v1/speaking/progress
pub async fn progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let (total, completed) = db::sessions::session_counts(&state.db, &user.id).await?;
    let recent = db::sessions::load_recent_sessions(&state.db, &user.id, 5).await?;
    let summaries: Vec<Value> = recent
        .iter()
        .map(|s| {
            json!({
                "session_id": s.id,
                "topic": s.topic_name,
                "started_at": s.started_at,
                "status": s.status,
                "duration_seconds": s.duration_seconds,
                "summary": s.summary,
            })
        })
        .collect();
    Ok(Json(json!({
        "total_sessions": total,
        "completed_sessions": completed,
        "speaking_score": user.speaking_score,
        "recent_sessions": summaries,
    })))
}
