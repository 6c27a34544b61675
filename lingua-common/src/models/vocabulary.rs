//! Vocabulary catalog entries and per-user word progress

use super::Difficulty;
use crate::srs::SrsRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordCategory {
    Common,
    Technical,
    Academic,
    Idiom,
}

impl WordCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordCategory::Common => "common",
            WordCategory::Technical => "technical",
            WordCategory::Academic => "academic",
            WordCategory::Idiom => "idiom",
        }
    }
}

impl std::str::FromStr for WordCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "common" => Ok(WordCategory::Common),
            "technical" => Ok(WordCategory::Technical),
            "academic" => Ok(WordCategory::Academic),
            "idiom" => Ok(WordCategory::Idiom),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown word category: {}",
                other
            ))),
        }
    }
}

/// How well the user knows a word, derived from SRS repetitions and accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    New,
    Learning,
    Reviewing,
    Mastered,
}

impl MasteryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::New => "new",
            MasteryLevel::Learning => "learning",
            MasteryLevel::Reviewing => "reviewing",
            MasteryLevel::Mastered => "mastered",
        }
    }
}

impl std::str::FromStr for MasteryLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "new" => Ok(MasteryLevel::New),
            "learning" => Ok(MasteryLevel::Learning),
            "reviewing" => Ok(MasteryLevel::Reviewing),
            "mastered" => Ok(MasteryLevel::Mastered),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown mastery level: {}",
                other
            ))),
        }
    }
}

/// Catalog word. Seeded at startup, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub id: String,
    pub word: String,
    pub part_of_speech: String,
    pub definition: String,
    pub example_sentence: String,
    pub ipa_pronunciation: String,
    pub category: WordCategory,
    pub subcategory: Option<String>,
    pub difficulty: Difficulty,
    /// 1 = most common
    pub frequency_rank: i64,
    pub portuguese_translation: Option<String>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
}

/// Per-user progress on one word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyProgress {
    /// `vocab_{user_id}_{word_id}`
    pub id: String,
    pub user_id: String,
    pub word_id: String,
    pub word: String,
    pub mastery_level: MasteryLevel,
    pub practice_count: i64,
    pub correct_count: i64,
    pub last_practiced: Option<DateTime<Utc>>,
    pub srs: SrsRecord,
    pub average_response_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VocabularyProgress {
    pub fn new(user_id: &str, word_id: &str, word: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!("vocab_{}_{}", user_id, word_id),
            user_id: user_id.to_string(),
            word_id: word_id.to_string(),
            word: word.to_string(),
            mastery_level: MasteryLevel::New,
            practice_count: 0,
            correct_count: 0,
            last_practiced: None,
            srs: SrsRecord::default(),
            average_response_time_ms: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fraction of practice attempts answered correctly, 0.0 when unpracticed
    pub fn accuracy(&self) -> f64 {
        if self.practice_count == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.practice_count as f64
        }
    }

    /// Re-derive the mastery level from current SRS state and accuracy
    pub fn derive_mastery(&self) -> MasteryLevel {
        if self.practice_count == 0 {
            return MasteryLevel::New;
        }
        let accuracy = self.accuracy();
        if self.srs.repetitions >= 5 && accuracy >= 0.85 {
            MasteryLevel::Mastered
        } else if self.srs.repetitions >= 2 && accuracy >= 0.7 {
            MasteryLevel::Reviewing
        } else if self.srs.repetitions >= 1 {
            MasteryLevel::Learning
        } else {
            MasteryLevel::New
        }
    }
}

/// A generated fill-in-the-blank exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyExercise {
    pub word_id: String,
    pub word: String,
    pub exercise_type: String,
    pub sentence: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub correct_index: i64,
    pub explanation: String,
    pub example_usage: Option<String>,
    pub context: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn practiced(repetitions: i64, correct: i64, total: i64) -> VocabularyProgress {
        let mut progress = VocabularyProgress::new("u1", "w1", "ubiquitous");
        progress.practice_count = total;
        progress.correct_count = correct;
        progress.srs.repetitions = repetitions;
        progress
    }

    #[test]
    fn unpracticed_word_is_new() {
        assert_eq!(practiced(0, 0, 0).derive_mastery(), MasteryLevel::New);
    }

    #[test]
    fn mastery_needs_repetitions_and_accuracy() {
        assert_eq!(practiced(5, 9, 10).derive_mastery(), MasteryLevel::Mastered);
        // high accuracy but too few repetitions
        assert_eq!(practiced(4, 9, 10).derive_mastery(), MasteryLevel::Reviewing);
        // enough repetitions but low accuracy
        assert_eq!(practiced(5, 8, 10).derive_mastery(), MasteryLevel::Reviewing);
    }

    #[test]
    fn one_repetition_means_learning() {
        assert_eq!(practiced(1, 1, 2).derive_mastery(), MasteryLevel::Learning);
    }

    #[test]
    fn practiced_but_never_passed_stays_new() {
        assert_eq!(practiced(0, 0, 3).derive_mastery(), MasteryLevel::New);
    }
}
