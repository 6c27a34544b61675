//! Conversation topics, speaking sessions, and detected errors

use super::Difficulty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown session status: {}",
                other
            ))),
        }
    }
}

/// Conversation topic catalog entry. Seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTopic {
    pub id: String,
    pub name: String,
    pub name_pt: String,
    pub description: String,
    pub description_pt: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub sample_questions: Vec<String>,
    pub vocabulary_hints: Vec<String>,
    pub opening_prompts: Vec<String>,
}

/// One turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationExchange {
    pub turn_number: i64,
    /// "user" or "agent"
    pub speaker: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Set for agent turns where TTS audio was produced
    #[serde(default)]
    pub audio_generated: bool,
    /// STT confidence for user turns submitted as audio
    pub transcription_confidence: Option<f64>,
}

/// A grammar mistake detected in a user turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarErrorDetail {
    pub rule: String,
    pub incorrect_text: String,
    pub correction: String,
    pub explanation: String,
    #[serde(default)]
    pub turn_number: i64,
}

/// A pronunciation miss detected in a user turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PronunciationErrorDetail {
    pub word: String,
    pub phoneme: Option<String>,
    pub accuracy_score: f64,
    #[serde(default)]
    pub turn_number: i64,
}

/// Summary written when a session ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_turns: i64,
    pub user_turns: i64,
    pub grammar_error_count: i64,
    pub pronunciation_error_count: i64,
    pub grammar_rules_violated: Vec<String>,
    pub problematic_phonemes: Vec<String>,
    pub feedback: String,
}

/// A speaking practice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingSession {
    /// `session_{user_id}_{unix_ts}`
    pub id: String,
    pub user_id: String,
    pub status: SessionStatus,
    pub topic_id: String,
    pub topic_name: String,
    pub topic_difficulty: Difficulty,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub exchanges: Vec<ConversationExchange>,
    pub current_turn: i64,
    pub grammar_errors: Vec<GrammarErrorDetail>,
    pub pronunciation_errors: Vec<PronunciationErrorDetail>,
    pub generated_activity_ids: Vec<String>,
    pub summary: Option<SessionSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SpeakingSession {
    pub fn new(user_id: &str, topic: &ConversationTopic) -> Self {
        let now = Utc::now();
        Self {
            id: format!("session_{}_{}", user_id, now.timestamp()),
            user_id: user_id.to_string(),
            status: SessionStatus::Active,
            topic_id: topic.id.clone(),
            topic_name: topic.name.clone(),
            topic_difficulty: topic.difficulty,
            started_at: now,
            ended_at: None,
            duration_seconds: 0,
            exchanges: Vec::new(),
            current_turn: 0,
            grammar_errors: Vec::new(),
            pronunciation_errors: Vec::new(),
            generated_activity_ids: Vec::new(),
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn, returning its turn number
    pub fn push_exchange(&mut self, speaker: &str, text: String, audio_generated: bool) -> i64 {
        self.current_turn += 1;
        self.exchanges.push(ConversationExchange {
            turn_number: self.current_turn,
            speaker: speaker.to_string(),
            text,
            timestamp: Utc::now(),
            audio_generated,
            transcription_confidence: None,
        });
        self.current_turn
    }
}
