//! Assessment agent
//!
//! Two assessment modes. The initial placement runs four steps, one per
//! pillar, and determines the starting level. Continuous assessment
//! derives pillar scores from stored practice statistics and decides
//! level changes. Steps are stateless on the server: each response
//! carries the running scores and the client echoes them back with the
//! next submission.

use async_trait::async_trait;
use chrono::Utc;
use lingua_common::db;
use lingua_common::models::user::EnglishLevel;
use lingua_common::{Error, Result};
use serde_json::{json, Map, Value};

use super::grammar::normalize;
use super::pronunciation::PASSING_ACCURACY;
use super::vocabulary::fallback_exercise;
use super::{Agent, AgentContext, ConversationState};
use crate::agents::state::AssessmentScores;

pub const TOTAL_STEPS: i64 = 4;
pub const VOCABULARY_ITEMS: usize = 20;
pub const GRAMMAR_ITEMS: usize = 5;
pub const PRONUNCIATION_ITEMS: usize = 5;
pub const SPEAKING_PROMPTS: usize = 3;

/// Every pillar must clear this for a beginner -> intermediate upgrade
const UPGRADE_PILLAR_MIN: f64 = 75.0;
/// Intermediate users falling below this overall go back to beginner
const DOWNGRADE_THRESHOLD: f64 = 65.0;
/// Pillars under this feed the recommendation list
const WEAK_PILLAR_THRESHOLD: f64 = 70.0;
/// A speaking answer needs at least this many words to count
const SPEAKING_MIN_WORDS: usize = 5;

const MIN_MASTERED_WORDS: i64 = 50;
const MIN_RULES_PRACTICED: i64 = 10;
const MIN_SOUNDS_PRACTICED: i64 = 5;
const MIN_SESSIONS_COMPLETED: i64 = 3;

pub struct AssessmentAgent;

#[async_trait]
impl Agent for AssessmentAgent {
    fn name(&self) -> &'static str {
        "assessment"
    }

    fn description(&self) -> &'static str {
        "Places users on the level scale and tracks level changes"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        if state.request_type == "assessment_continuous" {
            return self.continuous(ctx, state).await;
        }
        match state.action() {
            "submit" => self.submit_step(ctx, state).await,
            _ => self.start(ctx, state).await,
        }
    }
}

impl AssessmentAgent {
    async fn start(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let items = step_items(ctx, 1).await?;
        state.assessment.step = 1;
        state.record(self.name(), "started initial assessment");
        state.response = json!({
            "type": "assessment_step",
            "step": 1,
            "total_steps": TOTAL_STEPS,
            "pillar": "vocabulary",
            "items": items,
            "scores_so_far": {},
        });
        Ok(())
    }

    async fn submit_step(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let step = state
            .input_i64("step")
            .ok_or_else(|| Error::InvalidInput("step is required".to_string()))?;
        if !(1..=TOTAL_STEPS).contains(&step) {
            return Err(Error::InvalidInput(format!(
                "step must be 1..={}, got {}",
                TOTAL_STEPS, step
            )));
        }

        let answers = state
            .input
            .get("answers")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let (pillar, score) = match step {
            1 => ("vocabulary", self.score_vocabulary(ctx, &answers).await?),
            2 => ("grammar", self.score_grammar(ctx, &answers).await?),
            3 => ("pronunciation", self.score_pronunciation(ctx, &answers).await),
            _ => ("speaking", self.score_speaking(ctx, &answers).await),
        };

        let mut scores = state
            .input
            .get("scores_so_far")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new);
        scores.insert(pillar.to_string(), json!(score));
        state.record(self.name(), format!("step {} ({}) scored {:.0}", step, pillar, score));

        if step < TOTAL_STEPS {
            let next_step = step + 1;
            let items = step_items(ctx, next_step).await?;
            state.assessment.step = next_step;
            state.response = json!({
                "type": "assessment_step",
                "step": next_step,
                "total_steps": TOTAL_STEPS,
                "pillar": step_pillar(next_step),
                "items": items,
                "scores_so_far": scores,
            });
            return Ok(());
        }

        self.finalize_initial(ctx, state, &scores).await
    }

    async fn finalize_initial(
        &self,
        ctx: &AgentContext,
        state: &mut ConversationState,
        scores: &Map<String, Value>,
    ) -> Result<()> {
        let pillar_score = |pillar: &str| scores.get(pillar).and_then(Value::as_f64).unwrap_or(0.0);
        let final_scores = AssessmentScores {
            vocabulary: pillar_score("vocabulary"),
            grammar: pillar_score("grammar"),
            pronunciation: pillar_score("pronunciation"),
            speaking: pillar_score("speaking"),
            overall: (pillar_score("vocabulary")
                + pillar_score("grammar")
                + pillar_score("pronunciation")
                + pillar_score("speaking"))
                / 4.0,
        };

        let level = if final_scores.overall >= ctx.settings.intermediate_upgrade_threshold {
            EnglishLevel::Intermediate
        } else {
            EnglishLevel::Beginner
        };
        let recommendations = recommendations_for(&final_scores);

        let now = Utc::now();
        state.user.current_level = level;
        state.user.initial_assessment_completed = true;
        state.user.last_assessment_date = Some(now);
        state.user.sessions_since_last_assessment = 0;
        state.user.vocabulary_score = final_scores.vocabulary;
        state.user.grammar_score = final_scores.grammar;
        state.user.pronunciation_score = final_scores.pronunciation;
        state.user.speaking_score = final_scores.speaking;
        state.user.updated_at = now;
        db::users::save_user(&ctx.db, &state.user).await?;

        state.record(
            self.name(),
            format!("placement complete: {} (overall {:.0})", level, final_scores.overall),
        );
        state.response = json!({
            "type": "assessment_complete",
            "scores": final_scores,
            "determined_level": level,
            "recommendations": recommendations,
        });
        state.assessment.final_scores = Some(final_scores);
        state.assessment.determined_level = Some(level);
        state.assessment.recommendations = recommendations;
        Ok(())
    }

    async fn continuous(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let user_id = state.user.id.clone();

        let (words_practiced, words_mastered) =
            db::vocabulary::progress_counts(&ctx.db, &user_id).await?;
        let (rules_practiced, grammar_avg) = db::grammar::score_summary(&ctx.db, &user_id).await?;
        let (sounds_practiced, _sounds_mastered, pronunciation_avg) =
            db::pronunciation::accuracy_summary(&ctx.db, &user_id).await?;
        let (sessions_total, sessions_completed) =
            db::sessions::session_counts(&ctx.db, &user_id).await?;

        let vocabulary_score = if words_practiced > 0 {
            words_mastered as f64 / words_practiced as f64 * 100.0
        } else {
            0.0
        };
        let speaking_score = (sessions_total as f64 * 10.0).min(100.0);

        let final_scores = AssessmentScores {
            vocabulary: vocabulary_score,
            grammar: grammar_avg,
            pronunciation: pronunciation_avg,
            speaking: speaking_score,
            overall: (vocabulary_score + grammar_avg + pronunciation_avg + speaking_score) / 4.0,
        };

        let requirements = vec![
            requirement("overall_score", final_scores.overall, ctx.settings.intermediate_upgrade_threshold),
            requirement("vocabulary_score", final_scores.vocabulary, UPGRADE_PILLAR_MIN),
            requirement("grammar_score", final_scores.grammar, UPGRADE_PILLAR_MIN),
            requirement("pronunciation_score", final_scores.pronunciation, UPGRADE_PILLAR_MIN),
            requirement("speaking_score", final_scores.speaking, UPGRADE_PILLAR_MIN),
            requirement("words_mastered", words_mastered as f64, MIN_MASTERED_WORDS as f64),
            requirement("rules_practiced", rules_practiced as f64, MIN_RULES_PRACTICED as f64),
            requirement("sounds_practiced", sounds_practiced as f64, MIN_SOUNDS_PRACTICED as f64),
            requirement("sessions_completed", sessions_completed as f64, MIN_SESSIONS_COMPLETED as f64),
        ];
        let all_met = requirements
            .iter()
            .all(|r| r.get("met").and_then(Value::as_bool).unwrap_or(false));

        let previous_level = state.user.current_level;
        let level = match previous_level {
            EnglishLevel::Beginner if all_met => EnglishLevel::Intermediate,
            EnglishLevel::Intermediate if final_scores.overall < DOWNGRADE_THRESHOLD => {
                EnglishLevel::Beginner
            }
            level => level,
        };
        let recommendations = recommendations_for(&final_scores);

        let now = Utc::now();
        state.user.current_level = level;
        state.user.last_assessment_date = Some(now);
        state.user.sessions_since_last_assessment = 0;
        state.user.vocabulary_score = final_scores.vocabulary;
        state.user.grammar_score = final_scores.grammar;
        state.user.pronunciation_score = final_scores.pronunciation;
        state.user.speaking_score = final_scores.speaking;
        state.user.updated_at = now;
        db::users::save_user(&ctx.db, &state.user).await?;

        if level != previous_level {
            tracing::info!(user = %user_id, from = %previous_level, to = %level, "Level change");
        }
        state.record(
            self.name(),
            format!("continuous assessment: overall {:.0}, level {}", final_scores.overall, level),
        );
        state.response = json!({
            "type": "assessment_complete",
            "scores": final_scores,
            "determined_level": level,
            "level_changed": level != previous_level,
            "level_progress": requirements,
            "recommendations": recommendations,
        });
        state.assessment.final_scores = Some(final_scores);
        state.assessment.determined_level = Some(level);
        state.assessment.recommendations = recommendations;
        Ok(())
    }

    /// Fill-in-the-blank answers, checked by echoed index or by text
    /// against the word itself.
    async fn score_vocabulary(&self, ctx: &AgentContext, answers: &[Value]) -> Result<f64> {
        let mut correct = 0usize;
        for answer in answers.iter().take(VOCABULARY_ITEMS) {
            let Some(word_id) = answer.get("word_id").and_then(Value::as_str) else {
                continue;
            };
            let Some(word) = db::vocabulary::load_word(&ctx.db, word_id).await? else {
                continue;
            };
            let by_index = match (
                answer.get("answer_index").and_then(Value::as_i64),
                answer.get("correct_index").and_then(Value::as_i64),
            ) {
                (Some(a), Some(c)) => Some(a == c),
                _ => None,
            };
            let ok = by_index.unwrap_or_else(|| {
                answer
                    .get("answer")
                    .and_then(Value::as_str)
                    .map(|a| a.trim().eq_ignore_ascii_case(&word.word))
                    .unwrap_or(false)
            });
            if ok {
                correct += 1;
            }
        }
        Ok(step_score(correct, VOCABULARY_ITEMS))
    }

    /// Correct-the-sentence answers, checked against the rule's
    /// catalogued corrections.
    async fn score_grammar(&self, ctx: &AgentContext, answers: &[Value]) -> Result<f64> {
        let mut correct = 0usize;
        for answer in answers.iter().take(GRAMMAR_ITEMS) {
            let Some(rule_id) = answer.get("rule_id").and_then(Value::as_str) else {
                continue;
            };
            let Some(rule) = db::grammar::load_rule(&ctx.db, rule_id).await? else {
                continue;
            };
            let Some(text) = answer.get("answer").and_then(Value::as_str) else {
                continue;
            };
            let normalized = normalize(text);
            if rule
                .common_errors
                .iter()
                .any(|e| normalize(&e.correct) == normalized)
            {
                correct += 1;
            }
        }
        Ok(step_score(correct, GRAMMAR_ITEMS))
    }

    /// Audio answers scored through the speech service; an echoed
    /// `accuracy` (from the live practice socket) is accepted as is.
    async fn score_pronunciation(&self, ctx: &AgentContext, answers: &[Value]) -> f64 {
        let mut correct = 0usize;
        for answer in answers.iter().take(PRONUNCIATION_ITEMS) {
            let accuracy = match answer.get("accuracy").and_then(Value::as_f64) {
                Some(accuracy) => accuracy,
                None => self.assess_answer_audio(ctx, answer).await,
            };
            if accuracy >= PASSING_ACCURACY {
                correct += 1;
            }
        }
        step_score(correct, PRONUNCIATION_ITEMS)
    }

    async fn assess_answer_audio(&self, ctx: &AgentContext, answer: &Value) -> f64 {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

        let Some(encoded) = answer.get("audio").and_then(Value::as_str) else {
            return 0.0;
        };
        let Some(target) = answer.get("target_word").and_then(Value::as_str) else {
            return 0.0;
        };
        let Ok(audio) = BASE64.decode(encoded) else {
            return 0.0;
        };
        if audio.len() > ctx.settings.max_audio_bytes {
            return 0.0;
        }
        match ctx.speech.assess_pronunciation(&audio, target).await {
            Ok(assessment) => assessment.accuracy_score,
            Err(err) => {
                tracing::warn!(error = %err, "Assessment audio scoring failed");
                0.0
            }
        }
    }

    /// Open prompts count when the response is substantial. Audio
    /// answers are transcribed first.
    async fn score_speaking(&self, ctx: &AgentContext, answers: &[Value]) -> f64 {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

        let mut correct = 0usize;
        for answer in answers.iter().take(SPEAKING_PROMPTS) {
            let text = match answer.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None => {
                    let Some(encoded) = answer.get("audio").and_then(Value::as_str) else {
                        continue;
                    };
                    let Ok(audio) = BASE64.decode(encoded) else {
                        continue;
                    };
                    match ctx.speech.recognize(&audio).await {
                        Ok(transcription) => transcription.text,
                        Err(err) => {
                            tracing::warn!(error = %err, "Assessment speaking transcription failed");
                            continue;
                        }
                    }
                }
            };
            if text.split_whitespace().count() >= SPEAKING_MIN_WORDS {
                correct += 1;
            }
        }
        step_score(correct, SPEAKING_PROMPTS)
    }
}

fn step_pillar(step: i64) -> &'static str {
    match step {
        1 => "vocabulary",
        2 => "grammar",
        3 => "pronunciation",
        _ => "speaking",
    }
}

fn step_score(correct: usize, total: usize) -> f64 {
    correct as f64 / total as f64 * 100.0
}

/// Items the client answers for one step, drawn from the catalogs
async fn step_items(ctx: &AgentContext, step: i64) -> Result<Value> {
    match step {
        1 => {
            let words =
                db::vocabulary::list_words(&ctx.db, None, None, VOCABULARY_ITEMS as i64, 0).await?;
            let items: Vec<Value> = words
                .iter()
                .map(|word| {
                    let exercise = fallback_exercise(word);
                    json!({
                        "word_id": exercise.word_id,
                        "sentence": exercise.sentence,
                        "options": exercise.options,
                        "correct_index": exercise.correct_index,
                    })
                })
                .collect();
            Ok(json!(items))
        }
        2 => {
            let rules = db::grammar::list_rules(&ctx.db, None).await?;
            let items: Vec<Value> = rules
                .iter()
                .filter(|rule| !rule.common_errors.is_empty())
                .take(GRAMMAR_ITEMS)
                .map(|rule| {
                    let error = &rule.common_errors[0];
                    json!({
                        "rule_id": rule.id,
                        "instruction": "Rewrite the sentence correctly.",
                        "sentence": error.incorrect,
                    })
                })
                .collect();
            Ok(json!(items))
        }
        3 => {
            let sounds = db::pronunciation::list_sounds(&ctx.db).await?;
            let items: Vec<Value> = sounds
                .iter()
                .take(PRONUNCIATION_ITEMS)
                .map(|sound| {
                    json!({
                        "sound_id": sound.id,
                        "phoneme": sound.phoneme,
                        "target_word": sound.example_words.first(),
                        "tip": sound.tip,
                    })
                })
                .collect();
            Ok(json!(items))
        }
        _ => Ok(json!([
            {"prompt": "Introduce yourself: your name, where you live, and what you do."},
            {"prompt": "Describe your typical weekday from morning to evening."},
            {"prompt": "Talk about something you enjoyed doing last weekend."},
        ])),
    }
}

/// One row of the level-progress breakdown
fn requirement(name: &str, current: f64, target: f64) -> Value {
    json!({
        "requirement": name,
        "current": (current * 10.0).round() / 10.0,
        "target": target,
        "met": current >= target,
    })
}

/// Up to five focus suggestions, weakest pillars first
fn recommendations_for(scores: &AssessmentScores) -> Vec<String> {
    let mut pillars = [
        ("vocabulary", scores.vocabulary, "Review vocabulary daily and focus on technical words you miss."),
        ("grammar", scores.grammar, "Work through grammar lessons and explain each rule in your own words."),
        ("pronunciation", scores.pronunciation, "Practice the sounds that do not exist in Portuguese, especially th."),
        ("speaking", scores.speaking, "Hold longer speaking sessions to build fluency and confidence."),
    ];
    pillars.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut recommendations: Vec<String> = pillars
        .iter()
        .filter(|(_, score, _)| *score < WEAK_PILLAR_THRESHOLD)
        .map(|(_, _, advice)| advice.to_string())
        .collect();
    if recommendations.is_empty() {
        recommendations.push("Keep your streak going with a daily mix of all four pillars.".to_string());
    }
    recommendations.truncate(5);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_score_is_percentage_of_total() {
        assert_eq!(step_score(15, 20), 75.0);
        assert_eq!(step_score(0, 5), 0.0);
        assert_eq!(step_score(5, 5), 100.0);
    }

    #[test]
    fn weak_pillars_drive_recommendations_weakest_first() {
        let scores = AssessmentScores {
            vocabulary: 90.0,
            grammar: 40.0,
            pronunciation: 65.0,
            speaking: 55.0,
            overall: 62.5,
        };
        let recs = recommendations_for(&scores);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("grammar"));
        assert!(recs[1].contains("speaking") || recs[1].contains("fluency"));
    }

    #[test]
    fn strong_scores_get_a_single_keep_going_note() {
        let scores = AssessmentScores {
            vocabulary: 90.0,
            grammar: 88.0,
            pronunciation: 92.0,
            speaking: 85.0,
            overall: 88.75,
        };
        let recs = recommendations_for(&scores);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn requirement_rows_report_met_flag() {
        let row = requirement("words_mastered", 42.0, 50.0);
        assert_eq!(row["met"], false);
        assert_eq!(row["target"], 50.0);
        let row = requirement("overall_score", 86.4, 85.0);
        assert_eq!(row["met"], true);
    }

    #[test]
    fn step_pillars_follow_the_fixed_order() {
        assert_eq!(step_pillar(1), "vocabulary");
        assert_eq!(step_pillar(2), "grammar");
        assert_eq!(step_pillar(3), "pronunciation");
        assert_eq!(step_pillar(4), "speaking");
    }
}
