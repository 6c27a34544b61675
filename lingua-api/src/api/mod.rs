//! REST API for the learning backend
//!
//! All functional routes live under `/api/v1` behind JWT bearer auth;
//! `/health` and register/login are public. Endpoint handlers build an
//! orchestrator request for the matching request type and return its
//! response payload.

pub mod assessment;
pub mod auth;
pub mod grammar;
pub mod progress;
pub mod pronunciation;
pub mod speaking;
pub mod users;
pub mod vocabulary;
pub mod ws;

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use lingua_common::config::Settings;
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::agents::{ConversationState, Orchestrator};
use crate::error::{ApiError, ApiResult};
use crate::services::SpeechClient;

/// Per-user request limiter
pub type ApiLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub orchestrator: Arc<Orchestrator>,
    pub speech: Arc<SpeechClient>,
    pub settings: Arc<Settings>,
    pub connections: Arc<ws::ConnectionManager>,
    pub api_limiter: Arc<ApiLimiter>,
    pub port: u16,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        orchestrator: Arc<Orchestrator>,
        speech: Arc<SpeechClient>,
        settings: Arc<Settings>,
        port: u16,
    ) -> Self {
        let per_minute = NonZeroU32::new(settings.api_rate_limit_per_minute.max(1))
            .unwrap_or(NonZeroU32::MIN);
        Self {
            db,
            orchestrator,
            speech,
            settings,
            connections: Arc::new(ws::ConnectionManager::default()),
            api_limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            port,
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                .route("/users/register", post(users::register))
                .route("/users/login", post(users::login))
                .route("/users/me", get(users::me))
                .route("/users/me", put(users::update_me))
                .route("/users/:id", get(users::get_user))
                .route("/vocabulary/next-activity", get(vocabulary::next_activity))
                .route("/vocabulary/submit-answer", post(vocabulary::submit_answer))
                .route("/vocabulary/progress", get(vocabulary::progress))
                .route("/vocabulary/review-list", get(vocabulary::review_list))
                .route("/vocabulary/words", get(vocabulary::words))
                .route("/vocabulary/word/:id", get(vocabulary::word))
                .route("/grammar/next-lesson", get(grammar::next_lesson))
                .route("/grammar/submit-explanation", post(grammar::submit_explanation))
                .route("/grammar/exercises", get(grammar::exercises))
                .route("/grammar/submit-exercise", post(grammar::submit_exercise))
                .route("/grammar/progress", get(grammar::progress))
                .route("/grammar/rules", get(grammar::rules))
                .route("/grammar/rule/:id", get(grammar::rule))
                .route("/pronunciation/next-exercise", get(pronunciation::next_exercise))
                .route("/pronunciation/submit-audio", post(pronunciation::submit_audio))
                .route("/pronunciation/progress", get(pronunciation::progress))
                .route("/pronunciation/sounds", get(pronunciation::sounds))
                .route("/pronunciation/sound/:id", get(pronunciation::sound))
                .route("/pronunciation/guidance/:phoneme", get(pronunciation::guidance))
                .route("/speaking/start-session", post(speaking::start_session))
                .route("/speaking/turn", post(speaking::turn))
                .route("/speaking/end-session", post(speaking::end_session))
                .route("/speaking/active-session", get(speaking::active_session))
                .route("/speaking/topics", get(speaking::topics))
                .route("/speaking/progress", get(speaking::progress))
                .route("/progress/dashboard", get(progress::dashboard))
                .route("/progress/schedule/today", get(progress::schedule_today))
                .route("/progress/next-activity", get(progress::next_activity))
                .route("/progress/update", post(progress::update))
                .route("/progress/streak", get(progress::streak))
                .route("/progress/weekly-report", get(progress::weekly_report))
                .route("/assessment/start", post(assessment::start))
                .route("/assessment/submit", post(assessment::submit))
                .route("/assessment/status", get(assessment::status))
                .route("/ws/pronunciation", get(ws::pronunciation_socket)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint, no auth
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "lingua-api",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
    }))
}

/// Force an `action` field onto a request payload before it reaches the
/// orchestrator; non-object payloads are replaced.
pub(crate) fn with_action(mut body: serde_json::Value, action: &str) -> serde_json::Value {
    if !body.is_object() {
        body = json!({});
    }
    if let serde_json::Value::Object(map) = &mut body {
        map.insert("action".to_string(), json!(action));
    }
    body
}

/// Fold an orchestrator result into an API response, surfacing agent
/// failures as the matching HTTP status.
pub fn into_api_response(state: ConversationState) -> ApiResult<Json<serde_json::Value>> {
    if state.has_error {
        let message = state
            .error_message
            .unwrap_or_else(|| "Agent error".to_string());
        return Err(match state.error_kind.as_deref() {
            Some("not_found") => ApiError::NotFound(message),
            Some("invalid_input") => ApiError::BadRequest(message),
            Some("unauthorized") => ApiError::Unauthorized(message),
            Some("forbidden") => ApiError::Forbidden(message),
            Some("external_service") => ApiError::Upstream(message),
            _ => ApiError::Internal(message),
        });
    }
    Ok(Json(state.response))
}
