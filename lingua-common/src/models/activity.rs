//! Corrective activities generated from detected errors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority base for grammar activities. Grammar errors are common.
pub const GRAMMAR_PRIORITY: i64 = 2;
/// Priority base for pronunciation activities. These need more practice.
pub const PRONUNCIATION_PRIORITY: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Pending => "pending",
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ActivityStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "pending" => Ok(ActivityStatus::Pending),
            "in_progress" => Ok(ActivityStatus::InProgress),
            "completed" => Ok(ActivityStatus::Completed),
            "failed" => Ok(ActivityStatus::Failed),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown activity status: {}",
                other
            ))),
        }
    }
}

/// Pillar-specific activity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "pillar", rename_all = "lowercase")]
pub enum ActivityDetail {
    Grammar {
        rule: String,
        incorrect_example: String,
        correct_example: String,
        explanation: String,
    },
    Pronunciation {
        phoneme: Option<String>,
        word: String,
        accuracy_score: f64,
        average_accuracy: f64,
    },
}

impl ActivityDetail {
    pub fn pillar(&self) -> &'static str {
        match self {
            ActivityDetail::Grammar { .. } => "grammar",
            ActivityDetail::Pronunciation { .. } => "pronunciation",
        }
    }
}

/// A pending piece of corrective practice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectiveActivity {
    /// `activity_{user_id}_{unix_ts}`
    pub id: String,
    pub user_id: String,
    pub source_session_id: Option<String>,
    pub source_turn_number: i64,
    pub activity_type: String,
    pub detail: ActivityDetail,
    pub occurrence_count: i64,
    pub status: ActivityStatus,
    /// Higher runs sooner: base priority + min(occurrences, 5)
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CorrectiveActivity {
    pub fn new(
        id: String,
        user_id: &str,
        source_session_id: Option<String>,
        source_turn_number: i64,
        detail: ActivityDetail,
        occurrence_count: i64,
    ) -> Self {
        let base = match detail {
            ActivityDetail::Grammar { .. } => GRAMMAR_PRIORITY,
            ActivityDetail::Pronunciation { .. } => PRONUNCIATION_PRIORITY,
        };
        let activity_type = match detail {
            ActivityDetail::Grammar { .. } => "grammar_correction",
            ActivityDetail::Pronunciation { .. } => "pronunciation_practice",
        };
        let now = Utc::now();
        Self {
            id,
            user_id: user_id.to_string(),
            source_session_id,
            source_turn_number,
            activity_type: activity_type.to_string(),
            detail,
            occurrence_count,
            status: ActivityStatus::Pending,
            priority: base + occurrence_count.min(5),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_grows_with_occurrences_but_caps() {
        let grammar = |count| {
            CorrectiveActivity::new(
                "a1".to_string(),
                "u1",
                None,
                0,
                ActivityDetail::Grammar {
                    rule: "articles".to_string(),
                    incorrect_example: "I am engineer".to_string(),
                    correct_example: "I am an engineer".to_string(),
                    explanation: "Professions take an article".to_string(),
                },
                count,
            )
        };
        assert_eq!(grammar(1).priority, GRAMMAR_PRIORITY + 1);
        assert_eq!(grammar(5).priority, GRAMMAR_PRIORITY + 5);
        assert_eq!(grammar(12).priority, GRAMMAR_PRIORITY + 5);
    }

    #[test]
    fn pronunciation_outranks_grammar_at_equal_occurrences() {
        let pronunciation = CorrectiveActivity::new(
            "a2".to_string(),
            "u1",
            None,
            0,
            ActivityDetail::Pronunciation {
                phoneme: Some("θ".to_string()),
                word: "think".to_string(),
                accuracy_score: 55.0,
                average_accuracy: 58.0,
            },
            2,
        );
        let grammar = CorrectiveActivity::new(
            "a3".to_string(),
            "u1",
            None,
            0,
            ActivityDetail::Grammar {
                rule: "articles".to_string(),
                incorrect_example: "I am engineer".to_string(),
                correct_example: "I am an engineer".to_string(),
                explanation: "Professions take an article".to_string(),
            },
            2,
        );
        assert!(pronunciation.priority > grammar.priority);
        assert_eq!(pronunciation.activity_type, "pronunciation_practice");
        assert_eq!(pronunciation.status, ActivityStatus::Pending);
    }
}
