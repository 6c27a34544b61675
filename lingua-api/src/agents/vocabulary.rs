//! Vocabulary agent
//!
//! Picks the next word (SRS due, then low-frequency, then new words for
//! the user's level), generates a fill-in-the-blank exercise via the
//! LLM with a deterministic fallback, and applies answer submissions to
//! the user's progress.

use async_trait::async_trait;
use chrono::Utc;
use lingua_common::db;
use lingua_common::models::user::EnglishLevel;
use lingua_common::models::vocabulary::{VocabularyExercise, VocabularyProgress, VocabularyWord};
use lingua_common::srs;
use lingua_common::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

use super::{Agent, AgentContext, ConversationState};

/// Baseline response time for quality grading (ms)
const EXPECTED_RESPONSE_MS: u64 = 5000;

pub struct VocabularyAgent;

#[async_trait]
impl Agent for VocabularyAgent {
    fn name(&self) -> &'static str {
        "vocabulary"
    }

    fn description(&self) -> &'static str {
        "Selects words by review priority and runs vocabulary exercises"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        match state.action() {
            "submit_answer" => self.submit_answer(ctx, state).await,
            "review_list" => self.review_list(ctx, state).await,
            "progress" => self.progress_overview(ctx, state).await,
            _ => self.next_exercise(ctx, state).await,
        }
    }
}

impl VocabularyAgent {
    async fn next_exercise(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let word = select_word(ctx, state).await?;

        let exercise = match ctx.llm.generate_vocabulary_exercise(&word, state.user.current_level).await {
            Ok(exercise) => exercise,
            Err(err) => {
                tracing::warn!(
                    word = %word.word,
                    error = %err,
                    "LLM exercise generation failed, using fallback"
                );
                state.record(self.name(), format!("fallback exercise for {}", word.word));
                fallback_exercise(&word)
            }
        };

        state.record(self.name(), format!("exercise for word {}", word.id));
        state.response = json!({
            "type": "vocabulary_exercise",
            "exercise": exercise,
            "word": {
                "id": word.id,
                "word": word.word,
                "ipa_pronunciation": word.ipa_pronunciation,
                "portuguese_translation": word.portuguese_translation,
            },
        });
        Ok(())
    }

    async fn submit_answer(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let word_id = state
            .input_str("word_id")
            .ok_or_else(|| Error::InvalidInput("word_id is required".to_string()))?
            .to_string();
        let word = db::vocabulary::load_word(&ctx.db, &word_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Word {}", word_id)))?;

        let correct = check_answer(state, &word);
        let response_ms = state.input_i64("response_time_ms").unwrap_or(EXPECTED_RESPONSE_MS as i64).max(0) as u64;

        let mut progress = db::vocabulary::load_progress(&ctx.db, &state.user.id, &word_id)
            .await?
            .unwrap_or_else(|| VocabularyProgress::new(&state.user.id, &word_id, &word.word));

        let now = Utc::now();
        progress.practice_count += 1;
        if correct {
            progress.correct_count += 1;
        }
        progress.average_response_time_ms = Some(match progress.average_response_time_ms {
            Some(old) => (old + response_ms as i64) / 2,
            None => response_ms as i64,
        });

        let quality = srs::quality_from_response_time(response_ms, correct, EXPECTED_RESPONSE_MS);
        progress.srs = srs::apply_review(&progress.srs, quality);
        progress.last_practiced = Some(now);
        progress.mastery_level = progress.derive_mastery();
        progress.updated_at = now;

        db::vocabulary::save_progress(&ctx.db, &progress).await?;

        state.record(
            self.name(),
            format!("answer for {} correct={} quality={}", word_id, correct, quality),
        );
        state.activity_output = Some(json!({
            "pillar": "vocabulary",
            "score": if correct { 100.0 } else { 0.0 },
            "duration_seconds": (response_ms / 1000).max(1),
        }));
        state.response = json!({
            "type": "vocabulary_answer_result",
            "correct": correct,
            "correct_answer": word.word,
            "explanation": word.definition,
            "mastery_level": progress.mastery_level,
            "accuracy": progress.accuracy(),
            "next_review": progress.srs.next_review,
            "interval_days": progress.srs.interval_days,
        });
        Ok(())
    }

    async fn review_list(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let limit = state.input_i64("limit").unwrap_or(20).clamp(1, 100);
        let now = Utc::now();
        let due = db::vocabulary::load_due_words(&ctx.db, &state.user.id, now, limit).await?;

        let items: Vec<_> = due
            .iter()
            .map(|p| {
                json!({
                    "word_id": p.word_id,
                    "word": p.word,
                    "mastery_level": p.mastery_level,
                    "next_review": p.srs.next_review,
                    "priority": srs::review_priority(p.srs.next_review, now),
                })
            })
            .collect();

        state.response = json!({
            "type": "vocabulary_review_list",
            "count": items.len(),
            "items": items,
        });
        Ok(())
    }

    async fn progress_overview(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let all = db::vocabulary::load_all_progress(&ctx.db, &state.user.id).await?;
        let (total, mastered) = db::vocabulary::progress_counts(&ctx.db, &state.user.id).await?;
        let due = db::vocabulary::due_count(&ctx.db, &state.user.id, Utc::now()).await?;

        let total_practices: i64 = all.iter().map(|p| p.practice_count).sum();
        let total_correct: i64 = all.iter().map(|p| p.correct_count).sum();
        let accuracy = if total_practices > 0 {
            total_correct as f64 / total_practices as f64 * 100.0
        } else {
            0.0
        };

        state.response = json!({
            "type": "vocabulary_progress",
            "words_studied": total,
            "words_mastered": mastered,
            "words_due": due,
            "overall_accuracy": accuracy,
            "words": all,
        });
        Ok(())
    }
}

/// Word selection priority: SRS due, low-frequency, new by level, random.
async fn select_word(ctx: &AgentContext, state: &ConversationState) -> Result<VocabularyWord> {
    let now = Utc::now();
    let user_id = &state.user.id;

    // Most overdue review first
    let due = db::vocabulary::load_due_words(&ctx.db, user_id, now, 1).await?;
    if let Some(progress) = due.first() {
        if let Some(word) = db::vocabulary::load_word(&ctx.db, &progress.word_id).await? {
            return Ok(word);
        }
    }

    // Then a random low-frequency word the user is neglecting
    let low_frequency = db::vocabulary::load_low_frequency_words(&ctx.db, user_id, now, 10).await?;
    if !low_frequency.is_empty() {
        let pick = rand::thread_rng().gen_range(0..low_frequency.len());
        if let Some(word) = db::vocabulary::load_word(&ctx.db, &low_frequency[pick].word_id).await? {
            return Ok(word);
        }
    }

    // Then a new word by frequency rank for the user's level
    let level = match state.user.current_level {
        EnglishLevel::Beginner => "beginner",
        EnglishLevel::Intermediate => "intermediate",
    };
    let new = db::vocabulary::load_unpracticed_words(&ctx.db, user_id, Some(level), 1).await?;
    if let Some(word) = new.into_iter().next() {
        return Ok(word);
    }

    // Any level if the user exhausted their band
    let any_level = db::vocabulary::load_unpracticed_words(&ctx.db, user_id, None, 1).await?;
    if let Some(word) = any_level.into_iter().next() {
        return Ok(word);
    }

    db::vocabulary::load_random_word(&ctx.db)
        .await?
        .ok_or_else(|| Error::NotFound("Vocabulary catalog is empty".to_string()))
}

/// Deterministic exercise used when the LLM is unavailable: blank the
/// word out of its own example sentence.
pub(crate) fn fallback_exercise(word: &VocabularyWord) -> VocabularyExercise {
    let sentence = blank_out(&word.example_sentence, &word.word);

    let mut options = vec![
        word.word.clone(),
        "something".to_string(),
        "anything".to_string(),
        "nothing".to_string(),
    ];
    options.shuffle(&mut rand::thread_rng());
    let correct_index = options
        .iter()
        .position(|o| o == &word.word)
        .unwrap_or(0) as i64;

    VocabularyExercise {
        word_id: word.id.clone(),
        word: word.word.clone(),
        exercise_type: "fill_in_the_blank".to_string(),
        sentence,
        options,
        correct_answer: word.word.clone(),
        correct_index,
        explanation: word.definition.clone(),
        example_usage: Some(word.example_sentence.clone()),
        context: word.definition.clone(),
    }
}

/// Replace the first occurrence of `word` in `sentence` with a blank,
/// case-insensitively.
fn blank_out(sentence: &str, word: &str) -> String {
    let lower_sentence = sentence.to_lowercase();
    let lower_word = word.to_lowercase();
    match lower_sentence.find(&lower_word) {
        Some(pos) => {
            let mut result = String::with_capacity(sentence.len());
            result.push_str(&sentence[..pos]);
            result.push_str("___");
            result.push_str(&sentence[pos + word.len()..]);
            result
        }
        None => format!("___ — {}", sentence),
    }
}

/// Check a submitted answer by index when the client echoes the
/// exercise's correct index, by text otherwise.
fn check_answer(state: &ConversationState, word: &VocabularyWord) -> bool {
    if let (Some(answer_index), Some(correct_index)) =
        (state.input_i64("answer_index"), state.input_i64("correct_index"))
    {
        return answer_index == correct_index;
    }
    state
        .input_str("answer")
        .map(|answer| answer.trim().eq_ignore_ascii_case(&word.word))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_common::models::vocabulary::WordCategory;
    use lingua_common::models::Difficulty;
    use serde_json::json;

    fn test_word() -> VocabularyWord {
        VocabularyWord {
            id: "word_think".to_string(),
            word: "think".to_string(),
            part_of_speech: "verb".to_string(),
            definition: "To use your mind".to_string(),
            example_sentence: "I think we should leave early.".to_string(),
            ipa_pronunciation: "/θɪŋk/".to_string(),
            category: WordCategory::Common,
            subcategory: None,
            difficulty: Difficulty::Beginner,
            frequency_rank: 60,
            portuguese_translation: Some("pensar".to_string()),
            synonyms: vec![],
            antonyms: vec![],
        }
    }

    fn state_with(input: serde_json::Value) -> ConversationState {
        let user = lingua_common::models::user::User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        ConversationState::new("vocabulary_exercise", user, input)
    }

    #[test]
    fn blank_out_removes_word_case_insensitively() {
        assert_eq!(blank_out("I Think we should go.", "think"), "I ___ we should go.");
        assert_eq!(blank_out("No match here.", "think"), "___ — No match here.");
    }

    #[test]
    fn fallback_exercise_is_answerable() {
        let exercise = fallback_exercise(&test_word());
        assert_eq!(exercise.options.len(), 4);
        assert_eq!(
            exercise.options[exercise.correct_index as usize],
            exercise.correct_answer
        );
        assert!(exercise.sentence.contains("___"));
        assert!(!exercise.sentence.to_lowercase().contains("think"));
    }

    #[test]
    fn answer_checked_by_index_when_echoed() {
        let word = test_word();
        assert!(check_answer(
            &state_with(json!({"answer_index": 2, "correct_index": 2})),
            &word
        ));
        assert!(!check_answer(
            &state_with(json!({"answer_index": 1, "correct_index": 2})),
            &word
        ));
    }

    #[test]
    fn answer_checked_by_text_otherwise() {
        let word = test_word();
        assert!(check_answer(&state_with(json!({"answer": " THINK "})), &word));
        assert!(!check_answer(&state_with(json!({"answer": "thing"})), &word));
        assert!(!check_answer(&state_with(json!({})), &word));
    }
}
