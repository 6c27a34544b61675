//! Phonetic sound catalog and per-user pronunciation progress

use crate::srs::SrsRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How hard a sound is for Portuguese speakers specifically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundDifficulty {
    Low,
    Medium,
    High,
}

impl SoundDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundDifficulty::Low => "low",
            SoundDifficulty::Medium => "medium",
            SoundDifficulty::High => "high",
        }
    }

    /// Ordering key for easiest-first selection
    pub fn rank(&self) -> u8 {
        match self {
            SoundDifficulty::Low => 0,
            SoundDifficulty::Medium => 1,
            SoundDifficulty::High => 2,
        }
    }
}

impl std::str::FromStr for SoundDifficulty {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "low" => Ok(SoundDifficulty::Low),
            "medium" => Ok(SoundDifficulty::Medium),
            "high" => Ok(SoundDifficulty::High),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown sound difficulty: {}",
                other
            ))),
        }
    }
}

/// Articulation description shown when the user struggles with a sound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouthPosition {
    pub tongue: String,
    pub lips: String,
    pub teeth: Option<String>,
    pub airflow: Option<String>,
    pub voicing: Option<String>,
}

/// Catalog phonetic sound. Seeded at startup, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneticSound {
    pub id: String,
    /// IPA symbol, e.g. θ, ð, æ
    pub phoneme: String,
    /// Full name, e.g. "voiceless dental fricative"
    pub name: String,
    pub exists_in_portuguese: bool,
    pub difficulty: SoundDifficulty,
    pub mouth_position: MouthPosition,
    pub example_words: Vec<String>,
    pub common_mistake: String,
    pub portuguese_similar: Option<String>,
    pub tip: String,
}

/// One recorded attempt at a sound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PronunciationAttempt {
    pub timestamp: DateTime<Utc>,
    pub word: String,
    pub recognized_text: String,
    pub accuracy_score: f64,
}

/// Per-user progress on one phonetic sound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PronunciationProgress {
    /// `pronun_{user_id}_{sound_id}`
    pub id: String,
    pub user_id: String,
    pub sound_id: String,
    pub phoneme: String,
    pub practice_count: i64,
    pub last_practiced: Option<DateTime<Utc>>,
    /// Mean of `recent_accuracies`, 0..=100
    pub average_accuracy: f64,
    pub best_accuracy: f64,
    /// Last 10 accuracy scores
    pub recent_accuracies: Vec<f64>,
    /// Last 20 attempts
    pub practice_history: Vec<PronunciationAttempt>,
    pub srs: SrsRecord,
    pub mastered: bool,
    pub needs_mouth_position_review: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PronunciationProgress {
    pub fn new(user_id: &str, sound_id: &str, phoneme: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!("pronun_{}_{}", user_id, sound_id),
            user_id: user_id.to_string(),
            sound_id: sound_id.to_string(),
            phoneme: phoneme.to_string(),
            practice_count: 0,
            last_practiced: None,
            average_accuracy: 0.0,
            best_accuracy: 0.0,
            recent_accuracies: Vec::new(),
            practice_history: Vec::new(),
            srs: SrsRecord::default(),
            mastered: false,
            needs_mouth_position_review: true,
            created_at: now,
            updated_at: now,
        }
    }
}
