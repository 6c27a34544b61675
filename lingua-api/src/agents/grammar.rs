//! Grammar agent
//!
//! Serves lessons built around Portuguese-contrast explanations, scores
//! the user's own rule explanations through the LLM, and generates and
//! grades practice exercises.

use async_trait::async_trait;
use chrono::Utc;
use lingua_common::db;
use lingua_common::models::grammar::{GrammarExercise, GrammarProgress, GrammarRule};
use lingua_common::models::user::EnglishLevel;
use lingua_common::srs;
use lingua_common::{Error, Result};
use serde_json::json;

use super::{Agent, AgentContext, ConversationState};

/// Overall explanation score required to pass a rule
const EXPLANATION_PASS_SCORE: f64 = 70.0;
/// Shortest explanation worth sending to the LLM
const MIN_EXPLANATION_CHARS: usize = 10;
/// A rule with an average score below this counts as weak
const LOW_SCORE_THRESHOLD: f64 = 70.0;
/// Default exercise batch size
const DEFAULT_EXERCISE_COUNT: usize = 3;

pub struct GrammarAgent;

#[async_trait]
impl Agent for GrammarAgent {
    fn name(&self) -> &'static str {
        "grammar"
    }

    fn description(&self) -> &'static str {
        "Teaches grammar rules by contrast with Portuguese and grades practice"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        match state.action() {
            "submit_explanation" => self.submit_explanation(ctx, state).await,
            "exercises" => self.exercises(ctx, state).await,
            "submit_exercise" => self.submit_exercise(ctx, state).await,
            "progress" => self.progress_overview(ctx, state).await,
            _ => self.lesson(ctx, state).await,
        }
    }
}

impl GrammarAgent {
    async fn lesson(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let rule = select_rule(ctx, state).await?;

        // The contrast explanation is the heart of the lesson; fall back
        // to the catalog's stored explanation when the LLM is down.
        let contrast = match ctx.llm.portuguese_contrast(&rule).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(rule = %rule.id, error = %err, "Contrast explanation failed, using catalog text");
                rule.portuguese_explanation
                    .clone()
                    .unwrap_or_else(|| rule.english_explanation.clone())
            }
        };

        let progress = db::grammar::load_progress(&ctx.db, &state.user.id, &rule.id).await?;

        state.record(self.name(), format!("lesson for rule {}", rule.id));
        state.response = json!({
            "type": "grammar_lesson",
            "rule": rule,
            "portuguese_contrast": contrast,
            "progress": progress,
        });
        Ok(())
    }

    async fn submit_explanation(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let rule_id = required_rule_id(state)?;
        let explanation = state
            .input_str("explanation")
            .map(str::trim)
            .unwrap_or_default();
        if explanation.len() < MIN_EXPLANATION_CHARS {
            return Err(Error::InvalidInput(
                "Explanation is too short to evaluate".to_string(),
            ));
        }

        let rule = load_rule(ctx, &rule_id).await?;
        let evaluation = ctx.llm.evaluate_explanation(&rule, explanation).await?;
        let passed = evaluation.overall_score >= EXPLANATION_PASS_SCORE;

        let mut progress = load_or_new_progress(ctx, state, &rule).await?;
        let now = Utc::now();
        progress.practice_count += 1;
        if passed {
            progress.correct_count += 1;
        }
        progress.last_score = evaluation.overall_score;
        progress.best_explanation_score = progress.best_explanation_score.max(evaluation.overall_score);
        progress.srs = srs::apply_review(&progress.srs, srs::quality_from_accuracy(evaluation.overall_score));
        progress.last_practiced = Some(now);
        progress.updated_at = now;
        db::grammar::save_progress(&ctx.db, &progress).await?;

        state.record(
            self.name(),
            format!("explanation for {} scored {:.0}", rule_id, evaluation.overall_score),
        );
        state.activity_output = Some(json!({
            "pillar": "grammar",
            "score": evaluation.overall_score,
            "duration_seconds": 60,
        }));
        state.response = json!({
            "type": "grammar_explanation_result",
            "rule_id": rule_id,
            "passed": passed,
            "evaluation": evaluation,
            "best_explanation_score": progress.best_explanation_score,
            "next_review": progress.srs.next_review,
        });
        Ok(())
    }

    async fn exercises(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let rule_id = required_rule_id(state)?;
        let count = state
            .input_i64("count")
            .map(|c| c.clamp(1, 10) as usize)
            .unwrap_or(DEFAULT_EXERCISE_COUNT);
        let rule = load_rule(ctx, &rule_id).await?;

        let exercises = match ctx
            .llm
            .generate_grammar_exercises(&rule, count, state.user.current_level)
            .await
        {
            Ok(exercises) if !exercises.is_empty() => exercises,
            Ok(_) | Err(_) => {
                state.record(self.name(), format!("fallback exercises for {}", rule_id));
                fallback_exercises(&rule, count)
            }
        };

        state.response = json!({
            "type": "grammar_exercises",
            "rule_id": rule_id,
            "exercises": exercises,
        });
        Ok(())
    }

    async fn submit_exercise(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let rule_id = required_rule_id(state)?;
        let rule = load_rule(ctx, &rule_id).await?;

        let correct = check_exercise_answer(state);
        let score = if correct { 100.0 } else { 0.0 };

        let mut progress = load_or_new_progress(ctx, state, &rule).await?;
        let now = Utc::now();
        progress.practice_count += 1;
        if correct {
            progress.correct_count += 1;
        }
        progress.last_score = score;
        progress.srs = srs::apply_review(&progress.srs, srs::quality_from_accuracy(score));
        progress.last_practiced = Some(now);
        progress.updated_at = now;
        db::grammar::save_progress(&ctx.db, &progress).await?;

        state.record(self.name(), format!("exercise for {} correct={}", rule_id, correct));
        state.activity_output = Some(json!({
            "pillar": "grammar",
            "score": score,
            "duration_seconds": 30,
        }));
        state.response = json!({
            "type": "grammar_exercise_result",
            "rule_id": rule_id,
            "correct": correct,
            "correct_answer": state.input_str("correct_answer"),
            "next_review": progress.srs.next_review,
        });
        Ok(())
    }

    async fn progress_overview(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let all = db::grammar::load_all_progress(&ctx.db, &state.user.id).await?;
        let (rules_practiced, average_score) = db::grammar::score_summary(&ctx.db, &state.user.id).await?;
        let due = db::grammar::due_count(&ctx.db, &state.user.id, Utc::now()).await?;
        let total_rules = db::grammar::count_rules(&ctx.db).await?;

        state.response = json!({
            "type": "grammar_progress",
            "rules_practiced": rules_practiced,
            "total_rules": total_rules,
            "average_score": average_score,
            "rules_due": due,
            "rules": all,
        });
        Ok(())
    }
}

/// Rule selection: requested id, then SRS due, then weak score, then new.
async fn select_rule(ctx: &AgentContext, state: &ConversationState) -> Result<GrammarRule> {
    if let Some(rule_id) = state.input_str("rule_id") {
        return load_rule(ctx, rule_id).await;
    }

    let now = Utc::now();
    let user_id = &state.user.id;

    let due = db::grammar::load_due_rules(&ctx.db, user_id, now, 1).await?;
    if let Some(progress) = due.first() {
        if let Some(rule) = db::grammar::load_rule(&ctx.db, &progress.rule_id).await? {
            return Ok(rule);
        }
    }

    let weak = db::grammar::load_low_score_rules(&ctx.db, user_id, LOW_SCORE_THRESHOLD, 1).await?;
    if let Some(progress) = weak.first() {
        if let Some(rule) = db::grammar::load_rule(&ctx.db, &progress.rule_id).await? {
            return Ok(rule);
        }
    }

    let level = match state.user.current_level {
        EnglishLevel::Beginner => "beginner",
        EnglishLevel::Intermediate => "intermediate",
    };
    let new = db::grammar::load_unpracticed_rules(&ctx.db, user_id, Some(level), 1).await?;
    if let Some(rule) = new.into_iter().next() {
        return Ok(rule);
    }

    let any_level = db::grammar::load_unpracticed_rules(&ctx.db, user_id, None, 1).await?;
    any_level
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound("No grammar rules left to study".to_string()))
}

fn required_rule_id(state: &ConversationState) -> Result<String> {
    state
        .input_str("rule_id")
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput("rule_id is required".to_string()))
}

async fn load_rule(ctx: &AgentContext, rule_id: &str) -> Result<GrammarRule> {
    db::grammar::load_rule(&ctx.db, rule_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Grammar rule {}", rule_id)))
}

async fn load_or_new_progress(
    ctx: &AgentContext,
    state: &ConversationState,
    rule: &GrammarRule,
) -> Result<GrammarProgress> {
    Ok(db::grammar::load_progress(&ctx.db, &state.user.id, &rule.id)
        .await?
        .unwrap_or_else(|| GrammarProgress::new(&state.user.id, &rule.id, &rule.name)))
}

/// Correct-the-sentence exercises built from the rule's catalogued errors
pub(crate) fn fallback_exercises(rule: &GrammarRule, count: usize) -> Vec<GrammarExercise> {
    rule.common_errors
        .iter()
        .take(count)
        .map(|error| GrammarExercise {
            rule_id: rule.id.clone(),
            exercise_type: "correct_the_sentence".to_string(),
            instruction: "Rewrite the sentence correctly.".to_string(),
            sentence: error.incorrect.clone(),
            options: None,
            correct_answer: error.correct.clone(),
            correct_index: None,
            explanation: error.explanation.clone(),
        })
        .collect()
}

/// Check an exercise answer by echoed index, or by normalized text
fn check_exercise_answer(state: &ConversationState) -> bool {
    if let (Some(answer_index), Some(correct_index)) =
        (state.input_i64("answer_index"), state.input_i64("correct_index"))
    {
        return answer_index == correct_index;
    }
    match (state.input_str("answer"), state.input_str("correct_answer")) {
        (Some(answer), Some(correct)) => normalize(answer) == normalize(correct),
        _ => false,
    }
}

/// Lowercase and strip terminal punctuation for lenient comparison
pub(crate) fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_common::models::grammar::CommonError;
    use lingua_common::models::Difficulty;
    use serde_json::json;

    fn test_rule() -> GrammarRule {
        GrammarRule {
            id: "rule_articles".to_string(),
            name: "Indefinite articles with professions".to_string(),
            category: "articles".to_string(),
            difficulty: Difficulty::Beginner,
            english_explanation: "Professions take a/an".to_string(),
            portuguese_explanation: None,
            exists_in_portuguese: false,
            portuguese_equivalent: None,
            common_mistakes: vec![],
            examples: vec![],
            common_errors: vec![CommonError {
                incorrect: "I am engineer".to_string(),
                correct: "I am an engineer".to_string(),
                explanation: "Singular professions take a/an".to_string(),
            }],
        }
    }

    fn state_with(input: serde_json::Value) -> ConversationState {
        let user = lingua_common::models::user::User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        ConversationState::new("grammar_exercise", user, input)
    }

    #[test]
    fn fallback_exercises_come_from_catalogued_errors() {
        let exercises = fallback_exercises(&test_rule(), 3);
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].sentence, "I am engineer");
        assert_eq!(exercises[0].correct_answer, "I am an engineer");
    }

    #[test]
    fn exercise_answers_compare_leniently() {
        assert!(check_exercise_answer(&state_with(json!({
            "answer": "I am an engineer.",
            "correct_answer": "i am an engineer"
        }))));
        assert!(!check_exercise_answer(&state_with(json!({
            "answer": "I am engineer",
            "correct_answer": "I am an engineer"
        }))));
        assert!(check_exercise_answer(&state_with(json!({
            "answer_index": 1, "correct_index": 1
        }))));
        assert!(!check_exercise_answer(&state_with(json!({}))));
    }

    #[test]
    fn normalization_ignores_case_and_terminal_punctuation() {
        assert_eq!(normalize("She works every day."), "she works every day");
        assert_eq!(normalize("  Do you like coffee? "), "do you like coffee");
    }
}
