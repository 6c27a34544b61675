//! Shared conversation state threaded through the agent graph

use chrono::{DateTime, Utc};
use lingua_common::models::speaking::{GrammarErrorDetail, PronunciationErrorDetail};
use lingua_common::models::user::{EnglishLevel, User};
use lingua_common::models::Pillar;
use serde::Serialize;
use serde_json::Value;

/// Summary of what spaced repetition currently demands from the user
#[derive(Debug, Clone, Default, Serialize)]
pub struct SrsSummary {
    pub vocabulary_due: i64,
    pub grammar_due: i64,
    pub pronunciation_due: i64,
    pub low_frequency_items: Vec<SrsItem>,
    pub next_item: Option<SrsItem>,
}

/// One item surfaced by the scheduler
#[derive(Debug, Clone, Serialize)]
pub struct SrsItem {
    pub pillar: Pillar,
    pub item_id: String,
    pub label: String,
    pub reason: String,
}

/// Final per-pillar scores produced by an assessment
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentScores {
    pub vocabulary: f64,
    pub grammar: f64,
    pub pronunciation: f64,
    pub speaking: f64,
    pub overall: f64,
}

/// Assessment progress within one request
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssessmentBlock {
    pub step: i64,
    pub final_scores: Option<AssessmentScores>,
    pub determined_level: Option<EnglishLevel>,
    pub recommendations: Vec<String>,
}

/// Speaking-session view of the current request
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpeakingBlock {
    pub session_id: Option<String>,
    pub turn_count: i64,
    pub session_ended: bool,
}

/// Errors detected this request, waiting for the error-integration agent
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorsBlock {
    pub grammar: Vec<GrammarErrorDetail>,
    pub pronunciation: Vec<PronunciationErrorDetail>,
    pub generated_activity_ids: Vec<String>,
}

impl ErrorsBlock {
    pub fn has_pending(&self) -> bool {
        !self.grammar.is_empty() || !self.pronunciation.is_empty()
    }
}

/// One entry in the agent message trail
#[derive(Debug, Clone, Serialize)]
pub struct AgentMessage {
    pub agent: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The state one request carries through the graph
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// `req_{user_id}_{unix_ts}`
    pub request_id: String,
    pub request_type: String,
    /// Snapshot of the user row at request start
    pub user: User,
    /// Request payload as submitted by the endpoint
    pub input: Value,
    /// Output of the pillar agent that handled this request
    pub activity_output: Option<Value>,
    pub srs_summary: Option<SrsSummary>,
    pub assessment: AssessmentBlock,
    pub speaking: SpeakingBlock,
    pub errors: ErrorsBlock,
    pub messages: Vec<AgentMessage>,
    /// Response payload sent back to the client
    pub response: Value,
    pub is_complete: bool,
    pub has_error: bool,
    pub error_message: Option<String>,
    /// Error classification for the HTTP layer: not_found,
    /// invalid_input, unauthorized, forbidden, external_service, internal
    pub error_kind: Option<String>,
}

impl ConversationState {
    pub fn new(request_type: &str, user: User, input: Value) -> Self {
        let request_id = format!("req_{}_{}", user.id, Utc::now().timestamp());
        Self {
            request_id,
            request_type: request_type.to_string(),
            user,
            input,
            activity_output: None,
            srs_summary: None,
            assessment: AssessmentBlock::default(),
            speaking: SpeakingBlock::default(),
            errors: ErrorsBlock::default(),
            messages: Vec::new(),
            response: Value::Null,
            is_complete: false,
            has_error: false,
            error_message: None,
            error_kind: None,
        }
    }

    /// Append a note to the agent trail
    pub fn record(&mut self, agent: &str, content: impl Into<String>) {
        self.messages.push(AgentMessage {
            agent: agent.to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    /// String field from the request payload
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(Value::as_str)
    }

    /// Integer field from the request payload
    pub fn input_i64(&self, key: &str) -> Option<i64> {
        self.input.get(key).and_then(Value::as_i64)
    }

    /// Float field from the request payload
    pub fn input_f64(&self, key: &str) -> Option<f64> {
        self.input.get(key).and_then(Value::as_f64)
    }

    /// The requested action, defaulting per request type
    pub fn action(&self) -> &str {
        self.input_str("action").unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_user() -> User {
        User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        )
    }

    #[test]
    fn request_id_carries_user_id() {
        let user = test_user();
        let user_id = user.id.clone();
        let state = ConversationState::new("vocabulary_exercise", user, json!({}));
        assert!(state.request_id.starts_with(&format!("req_{}_", user_id)));
        assert!(!state.is_complete);
        assert!(!state.has_error);
    }

    #[test]
    fn input_accessors_read_payload() {
        let state = ConversationState::new(
            "vocabulary_exercise",
            test_user(),
            json!({"action": "submit_answer", "response_time_ms": 2500, "accuracy": 87.5}),
        );
        assert_eq!(state.action(), "submit_answer");
        assert_eq!(state.input_i64("response_time_ms"), Some(2500));
        assert_eq!(state.input_f64("accuracy"), Some(87.5));
        assert_eq!(state.input_str("missing"), None);
    }

    #[test]
    fn errors_block_reports_pending() {
        let mut state = ConversationState::new("speaking_session", test_user(), json!({}));
        assert!(!state.errors.has_pending());
        state.errors.grammar.push(GrammarErrorDetail {
            rule: "articles".to_string(),
            incorrect_text: "I am engineer".to_string(),
            correction: "I am an engineer".to_string(),
            explanation: "Professions take an article".to_string(),
            turn_number: 1,
        });
        assert!(state.errors.has_pending());
    }
}
