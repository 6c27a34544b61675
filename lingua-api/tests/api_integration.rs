//! Integration tests for the Lingua API
//!
//! Exercises the HTTP surface end to end against a temporary SQLite
//! database with the built-in catalogs seeded. The LLM and speech
//! clients are left unconfigured, so exercise generation goes through
//! the deterministic fallbacks.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use lingua_api::agents::orchestrator::Orchestrator;
use lingua_api::agents::AgentContext;
use lingua_api::api::{create_router, AppState};
use lingua_api::content::seed_catalogs;
use lingua_api::services::openai_client::OpenAiClient;
use lingua_api::services::speech_client::SpeechClient;
use lingua_common::config::Settings;
use lingua_common::db::init::init_database;

/// Test helper to create a test server on a fresh database
async fn setup_test_server() -> (axum::Router, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = init_database(&dir.path().join("test.db"))
        .await
        .expect("Failed to initialize database");
    seed_catalogs(&db).await.expect("Failed to seed catalogs");

    let settings = Arc::new(Settings::default());
    let llm = Arc::new(OpenAiClient::new(settings.openai.clone()).expect("Failed to build LLM client"));
    let speech =
        Arc::new(SpeechClient::new(settings.speech.clone()).expect("Failed to build speech client"));

    let orchestrator = Arc::new(Orchestrator::new(AgentContext {
        db: db.clone(),
        llm,
        speech: speech.clone(),
        settings: settings.clone(),
    }));

    let state = AppState::new(db, orchestrator, speech, settings, 8080);
    (create_router(state), dir)
}

/// Helper function to make HTTP requests to the test server
async fn make_request(
    app: &axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "DELETE" => Method::DELETE,
        _ => panic!("Unsupported method"),
    };

    let mut request = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = if let Some(json_body) = body {
        request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap()
    } else {
        request.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json_body = if !body.is_empty() {
        Some(serde_json::from_slice(&body).unwrap())
    } else {
        None
    };

    (status, json_body)
}

/// Register a user and return their bearer token
async fn register_user(app: &axum::Router, email: &str) -> String {
    let (status, body) = make_request(
        app,
        "POST",
        "/api/v1/users/register",
        Some(json!({
            "email": email,
            "name": "Test User",
            "password": "correct-horse-battery",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body.unwrap()["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = setup_test_server().await;

    let (status, body) = make_request(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("Expected response body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lingua-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_register_and_login() {
    let (app, _dir) = setup_test_server().await;

    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/users/register",
        Some(json!({
            "email": "Maria@Example.com",
            "name": "Maria",
            "password": "segura-o-bastante",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let body = body.unwrap();
    assert!(body["token"].is_string());
    // Emails are normalized to lowercase
    assert_eq!(body["user"]["email"], "maria@example.com");
    assert_eq!(body["user"]["current_level"], "beginner");

    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/users/login",
        Some(json!({"email": "maria@example.com", "password": "segura-o-bastante"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.unwrap()["token"].is_string());

    // Wrong password is a 401
    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/users/login",
        Some(json!({"email": "maria@example.com", "password": "wrong-password"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _dir) = setup_test_server().await;

    // Short password
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/users/register",
        Some(json!({"email": "a@b.com", "name": "A", "password": "short"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"]["code"], "BAD_REQUEST");

    // Not an email
    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/users/register",
        Some(json!({"email": "not-an-email", "name": "A", "password": "long-enough-pw"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Duplicate email
    register_user(&app, "dup@example.com").await;
    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/users/register",
        Some(json!({"email": "dup@example.com", "name": "B", "password": "long-enough-pw"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_required() {
    let (app, _dir) = setup_test_server().await;

    let (status, response_body) = make_request(&app, "GET", "/api/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response_body.unwrap()["error"]["code"], "UNAUTHORIZED");

    let (status, _) =
        make_request(&app, "GET", "/api/v1/users/me", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_endpoints() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "profile@example.com").await;

    let (status, body) =
        make_request(&app, "GET", "/api/v1/users/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["email"], "profile@example.com");
    let user_id = body["id"].as_str().unwrap().to_string();

    // Users can read their own record by id, no one else's
    let (status, _) = make_request(
        &app,
        "GET",
        &format!("/api/v1/users/{}", user_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = make_request(
        &app,
        "GET",
        "/api/v1/users/someone-else",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Update the daily goal
    let (status, body) = make_request(
        &app,
        "PUT",
        "/api/v1/users/me",
        Some(json!({"daily_goal_minutes": 45, "name": "Renamed"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["profile"]["daily_goal_minutes"], 45);

    // Out-of-range goal is rejected
    let (status, _) = make_request(
        &app,
        "PUT",
        "/api/v1/users/me",
        Some(json!({"daily_goal_minutes": 600})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vocabulary_exercise_flow() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "vocab@example.com").await;

    // Fallback exercise from the seeded catalog (LLM unconfigured)
    let (status, body) =
        make_request(&app, "GET", "/api/v1/vocabulary/next-activity", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "vocabulary_exercise");
    let word_id = body["word"]["id"].as_str().unwrap().to_string();
    assert!(body["exercise"]["sentence"].is_string());

    // A wrong answer still records progress
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/vocabulary/submit-answer",
        Some(json!({
            "word_id": word_id,
            "answer": "definitely not the word",
            "response_time_ms": 1200,
        })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "vocabulary_answer_result");
    assert_eq!(body["correct"], false);
    assert!(body["next_review"].is_string());

    let (status, body) =
        make_request(&app, "GET", "/api/v1/vocabulary/progress", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "vocabulary_progress");
    assert_eq!(body["words_studied"], 1);

    // Missing word_id is a 400 out of the agent graph
    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/vocabulary/submit-answer",
        Some(json!({"answer": "x"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown word is a 404
    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/vocabulary/submit-answer",
        Some(json!({"word_id": "no-such-word", "answer": "x"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vocabulary_catalog() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "catalog@example.com").await;

    let (status, body) =
        make_request(&app, "GET", "/api/v1/vocabulary/words?limit=5", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let words = body["words"].as_array().unwrap();
    assert!(!words.is_empty());
    assert!(words.len() <= 5);
    assert!(body["total"].as_i64().unwrap() > 0);

    let id = words[0]["id"].as_str().unwrap();
    let (status, body) = make_request(
        &app,
        "GET",
        &format!("/api/v1/vocabulary/word/{}", id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["word"]["id"], id);

    let (status, _) = make_request(
        &app,
        "GET",
        "/api/v1/vocabulary/word/missing",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_grammar_endpoints() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "grammar@example.com").await;

    let (status, body) =
        make_request(&app, "GET", "/api/v1/grammar/rules", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let rules = body["rules"].as_array().unwrap();
    assert!(!rules.is_empty());

    let rule_id = rules[0]["id"].as_str().unwrap().to_string();
    let (status, body) = make_request(
        &app,
        "GET",
        &format!("/api/v1/grammar/rule/{}", rule_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["rule"]["id"], rule_id);

    let (status, body) =
        make_request(&app, "GET", "/api/v1/grammar/next-lesson", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "grammar_lesson");

    // Fallback exercises come from the rule's common errors
    let (status, body) = make_request(
        &app,
        "GET",
        &format!("/api/v1/grammar/exercises?rule_id={}", rule_id),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "grammar_exercises");

    let (status, body) =
        make_request(&app, "GET", "/api/v1/grammar/progress", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "grammar_progress");
}

#[tokio::test]
async fn test_pronunciation_catalog() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "pron@example.com").await;

    let (status, body) =
        make_request(&app, "GET", "/api/v1/pronunciation/sounds", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let sounds = body["sounds"].as_array().unwrap();
    assert!(!sounds.is_empty());

    let phoneme = sounds[0]["phoneme"].as_str().unwrap().to_string();
    let (status, body) = make_request(
        &app,
        "GET",
        &format!("/api/v1/pronunciation/guidance/{}", phoneme),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.unwrap()["guidance"].is_object());

    let (status, _) = make_request(
        &app,
        "GET",
        "/api/v1/pronunciation/guidance/zz-missing",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        make_request(&app, "GET", "/api/v1/pronunciation/next-exercise", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "pronunciation_exercise");
}

#[tokio::test]
async fn test_speaking_session_lifecycle() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "speak@example.com").await;

    // No session yet
    let (status, body) =
        make_request(&app, "GET", "/api/v1/speaking/active-session", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["active"], false);

    let (status, body) =
        make_request(&app, "GET", "/api/v1/speaking/topics", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.unwrap()["topics"].as_array().unwrap().is_empty());

    // Start a session; speech is unconfigured so no reference audio
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/speaking/start-session",
        Some(json!({})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "speaking_session_started");
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert!(body["agent_message"].is_string());
    // Beginners get conversation scaffolding
    assert!(body["beginner_help"].is_object());

    let (status, body) =
        make_request(&app, "GET", "/api/v1/speaking/active-session", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["active"], true);

    // Starting again resumes instead of stacking a second session
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/speaking/start-session",
        Some(json!({})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "speaking_session_resumed");
    assert_eq!(body["session"]["id"], session_id.as_str());

    // A text turn (LLM fallback reply)
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/speaking/turn",
        Some(json!({"session_id": session_id, "text": "I like travel to new places"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "speaking_turn");
    assert_eq!(body["turn_number"], 2);
    assert!(body["agent_message"].is_string());

    // Empty turn is rejected
    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/speaking/turn",
        Some(json!({"session_id": session_id, "text": ""})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/speaking/end-session",
        Some(json!({"session_id": session_id})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "speaking_session_summary");
    assert!(body["summary"].is_object());

    let (status, body) =
        make_request(&app, "GET", "/api/v1/speaking/active-session", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["active"], false);
}

#[tokio::test]
async fn test_progress_endpoints() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "progress@example.com").await;

    let (status, body) =
        make_request(&app, "GET", "/api/v1/progress/dashboard", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "progress_dashboard");

    let (status, body) =
        make_request(&app, "GET", "/api/v1/progress/streak", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "streak");
    assert_eq!(body["current_days"], 0);

    // Recording an activity starts the streak and schedule progress
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/progress/update",
        Some(json!({"pillar": "vocabulary", "score": 80.0, "duration_seconds": 120})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "progress_updated");

    let (status, body) =
        make_request(&app, "GET", "/api/v1/progress/streak", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["current_days"], 1);

    let (status, body) =
        make_request(&app, "GET", "/api/v1/progress/schedule/today", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "daily_schedule");
    assert!(body["schedule"].is_object());

    let (status, body) =
        make_request(&app, "GET", "/api/v1/progress/next-activity", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "next_activity");

    let (status, body) =
        make_request(&app, "GET", "/api/v1/progress/weekly-report", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["type"], "weekly_report");
}

#[tokio::test]
async fn test_assessment_flow() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "assess@example.com").await;

    let (status, body) =
        make_request(&app, "GET", "/api/v1/assessment/status", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["initial_assessment_completed"], false);
    assert_eq!(body["current_level"], "beginner");

    // A fresh user gets the initial placement, starting at step 1
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/assessment/start",
        Some(json!({})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["type"], "assessment_step");
    assert_eq!(body["step"], 1);
    assert_eq!(body["total_steps"], 4);
    assert!(!body["items"].as_array().unwrap().is_empty());

    // Submitting step 1 advances to step 2 even with no answers
    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/assessment/submit",
        Some(json!({"step": 1, "answers": []})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["step"], 2);

    // Step out of range is rejected
    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/assessment/submit",
        Some(json!({"step": 9})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orchestrator_responses_are_stamped() {
    let (app, _dir) = setup_test_server().await;
    let token = register_user(&app, "stamp@example.com").await;

    let (status, body) =
        make_request(&app, "GET", "/api/v1/progress/dashboard", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert!(body["request_id"].is_string());
    assert!(body["timestamp"].is_string());
}
