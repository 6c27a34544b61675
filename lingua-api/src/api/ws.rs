//! Live pronunciation practice over WebSocket
//!
//! `GET /api/v1/ws/pronunciation?token=` upgrades to a socket that
//! accepts audio for on-the-spot assessment and serves reference audio
//! for target words. Auth rides in the query string because browsers
//! cannot set headers on WebSocket upgrades.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use lingua_common::auth::verify_token;
use lingua_common::db;
use lingua_common::models::user::User;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Open sockets per user
#[derive(Default)]
pub struct ConnectionManager {
    connections: Mutex<HashMap<String, usize>>,
}

impl ConnectionManager {
    fn register(&self, user_id: &str) -> usize {
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        let count = connections.entry(user_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn unregister(&self, user_id: &str) {
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = connections.get_mut(user_id) {
            *count -= 1;
            if *count == 0 {
                connections.remove(user_id);
            }
        }
    }

    pub fn active_connections(&self, user_id: &str) -> usize {
        let connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        connections.get(user_id).copied().unwrap_or(0)
    }
}

/// GET /api/v1/ws/pronunciation?token=
pub async fn pronunciation_socket(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let claims = verify_token(&query.token, &state.settings.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    let user = db::users::load_user_by_id(&state.db, &claims.sub)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, user: User) {
    let session_id = format!("ws_{}_{}", user.id, Utc::now().timestamp());
    let open = state.connections.register(&user.id);
    tracing::info!(user_id = %user.id, session_id = %session_id, open, "WebSocket connected");

    let hello = json!({
        "type": "connected",
        "session_id": session_id,
        "user_id": user.id,
    });
    if socket.send(Message::Text(hello.to_string())).await.is_err() {
        state.connections.unregister(&user.id);
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let request: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => {
                let _ = socket
                    .send(Message::Text(
                        json!({"type": "error", "message": "Invalid JSON"}).to_string(),
                    ))
                    .await;
                continue;
            }
        };

        let reply = dispatch(&state, &user, &request).await;
        if socket.send(Message::Text(reply.to_string())).await.is_err() {
            break;
        }
    }

    state.connections.unregister(&user.id);
    tracing::info!(user_id = %user.id, session_id = %session_id, "WebSocket disconnected");
}

/// One message in, one reply out
async fn dispatch(state: &AppState, user: &User, request: &Value) -> Value {
    match request.get("type").and_then(Value::as_str) {
        Some("audio_chunk") => json!({"type": "chunk_received"}),
        Some("audio_complete") => assess(state, request).await,
        Some("get_reference") => reference_audio(state, user, request).await,
        _ => json!({"type": "unknown"}),
    }
}

async fn assess(state: &AppState, request: &Value) -> Value {
    let Some(encoded) = request.get("audio").and_then(Value::as_str) else {
        return json!({"type": "error", "message": "audio is required"});
    };
    let Some(reference_text) = request.get("reference_text").and_then(Value::as_str) else {
        return json!({"type": "error", "message": "reference_text is required"});
    };
    let audio = match BASE64.decode(encoded) {
        Ok(audio) => audio,
        Err(_) => return json!({"type": "error", "message": "Invalid base64 audio"}),
    };
    if audio.len() > state.settings.max_audio_bytes {
        return json!({"type": "error", "message": "Audio payload too large"});
    }

    match state.speech.assess_pronunciation(&audio, reference_text).await {
        Ok(assessment) => json!({
            "type": "assessment_result",
            "sound_id": request.get("sound_id"),
            "assessment": assessment,
        }),
        Err(err) => {
            tracing::warn!(error = %err, "Socket pronunciation assessment failed");
            json!({"type": "error", "message": err.to_string()})
        }
    }
}

async fn reference_audio(state: &AppState, user: &User, request: &Value) -> Value {
    let Some(word) = request.get("word").and_then(Value::as_str) else {
        return json!({"type": "error", "message": "word is required"});
    };
    let voice = request
        .get("voice")
        .and_then(Value::as_str)
        .unwrap_or(&user.profile.voice_preference);

    match state.speech.synthesize(word, voice).await {
        Ok(audio) => json!({
            "type": "reference_audio",
            "word": word,
            "audio": BASE64.encode(audio),
        }),
        Err(err) => {
            tracing::warn!(error = %err, "Socket reference synthesis failed");
            json!({"type": "error", "message": err.to_string()})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_counts_track_register_and_unregister() {
        let manager = ConnectionManager::default();
        assert_eq!(manager.active_connections("u1"), 0);
        assert_eq!(manager.register("u1"), 1);
        assert_eq!(manager.register("u1"), 2);
        manager.unregister("u1");
        assert_eq!(manager.active_connections("u1"), 1);
        manager.unregister("u1");
        assert_eq!(manager.active_connections("u1"), 0);
    }
}
