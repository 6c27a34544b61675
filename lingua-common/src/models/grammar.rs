//! Grammar rule catalog and per-user rule progress

use super::Difficulty;
use crate::srs::SrsRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bilingual example sentence pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarExample {
    pub english: String,
    pub portuguese: String,
}

/// An incorrect/correct pair with an explanation of the fix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonError {
    pub incorrect: String,
    pub correct: String,
    pub explanation: String,
}

/// Catalog grammar rule. Seeded at startup, read-only afterwards.
///
/// Portuguese-contrast fields drive the lesson content: rules that behave
/// differently from (or do not exist in) Portuguese get extra attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarRule {
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub english_explanation: String,
    pub portuguese_explanation: Option<String>,
    pub exists_in_portuguese: bool,
    pub portuguese_equivalent: Option<String>,
    pub common_mistakes: Vec<String>,
    pub examples: Vec<GrammarExample>,
    pub common_errors: Vec<CommonError>,
}

/// Per-user progress on one grammar rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarProgress {
    /// `grammar_{user_id}_{rule_id}`
    pub id: String,
    pub user_id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub practice_count: i64,
    pub correct_count: i64,
    pub last_practiced: Option<DateTime<Utc>>,
    /// Score of the most recent explanation or exercise, 0..=100
    pub last_score: f64,
    pub best_explanation_score: f64,
    pub srs: SrsRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GrammarProgress {
    pub fn new(user_id: &str, rule_id: &str, rule_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!("grammar_{}_{}", user_id, rule_id),
            user_id: user_id.to_string(),
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            practice_count: 0,
            correct_count: 0,
            last_practiced: None,
            last_score: 0.0,
            best_explanation_score: 0.0,
            srs: SrsRecord::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A generated grammar exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarExercise {
    pub rule_id: String,
    pub exercise_type: String,
    pub instruction: String,
    pub sentence: String,
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub correct_index: Option<i64>,
    pub explanation: String,
}

/// LLM evaluation of a user's rule explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationEvaluation {
    pub accuracy_score: f64,
    pub completeness_score: f64,
    pub understanding_score: f64,
    pub overall_score: f64,
    pub feedback: String,
    #[serde(default)]
    pub missing_points: Vec<String>,
    #[serde(default)]
    pub suggestions: String,
}
