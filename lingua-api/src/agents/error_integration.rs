//! Error-integration agent
//!
//! Turns errors detected during practice into pending corrective
//! activities. Errors are deduplicated first (grammar by rule,
//! pronunciation by phoneme or word) so one recurring mistake becomes
//! one activity with an occurrence count feeding its priority.

use async_trait::async_trait;
use chrono::Utc;
use lingua_common::db;
use lingua_common::models::activity::{ActivityDetail, CorrectiveActivity};
use lingua_common::models::speaking::{GrammarErrorDetail, PronunciationErrorDetail};
use lingua_common::Result;
use serde_json::{json, Value};

use super::{Agent, AgentContext, ConversationState};

/// Upper bound on corrective activities generated from one session
const MAX_ACTIVITIES_PER_SESSION: usize = 10;

pub struct ErrorIntegrationAgent;

#[async_trait]
impl Agent for ErrorIntegrationAgent {
    fn name(&self) -> &'static str {
        "error_integration"
    }

    fn description(&self) -> &'static str {
        "Converts detected errors into prioritized corrective activities"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        if !state.errors.has_pending() {
            return Ok(());
        }

        let grammar = dedupe_grammar(std::mem::take(&mut state.errors.grammar));
        let pronunciation = dedupe_pronunciation(std::mem::take(&mut state.errors.pronunciation));
        let (grammar_take, pronunciation_take) =
            split_cap(grammar.len(), pronunciation.len(), MAX_ACTIVITIES_PER_SESSION);

        let user_id = state.user.id.clone();
        let session_id = state.speaking.session_id.clone();
        let ts = Utc::now().timestamp();
        let mut generated = Vec::new();

        for (n, (error, count, average)) in
            pronunciation.into_iter().take(pronunciation_take).enumerate()
        {
            let activity = CorrectiveActivity::new(
                format!("activity_{}_{}_p{}", user_id, ts, n),
                &user_id,
                session_id.clone(),
                error.turn_number,
                ActivityDetail::Pronunciation {
                    phoneme: error.phoneme.clone(),
                    word: error.word.clone(),
                    accuracy_score: error.accuracy_score,
                    average_accuracy: average,
                },
                count,
            );
            db::activities::save_activity(&ctx.db, &activity).await?;
            generated.push(activity.id);
        }

        for (n, (error, count)) in grammar.into_iter().take(grammar_take).enumerate() {
            let activity = CorrectiveActivity::new(
                format!("activity_{}_{}_g{}", user_id, ts, n),
                &user_id,
                session_id.clone(),
                error.turn_number,
                ActivityDetail::Grammar {
                    rule: error.rule.clone(),
                    incorrect_example: error.incorrect_text.clone(),
                    correct_example: error.correction.clone(),
                    explanation: error.explanation.clone(),
                },
                count,
            );
            db::activities::save_activity(&ctx.db, &activity).await?;
            generated.push(activity.id);
        }

        // Record the generated work on the source session
        if let Some(session_id) = &session_id {
            if let Some(mut session) =
                db::sessions::load_session(&ctx.db, &user_id, session_id).await?
            {
                session.generated_activity_ids.extend(generated.iter().cloned());
                session.updated_at = Utc::now();
                db::sessions::save_session(&ctx.db, &session).await?;
            }
        }

        state.record(
            self.name(),
            format!("generated {} corrective activities", generated.len()),
        );
        if let Value::Object(map) = &mut state.response {
            map.insert("generated_activities".to_string(), json!(generated.len()));
        }
        state.errors.generated_activity_ids = generated;
        Ok(())
    }
}

/// Collapse grammar errors to one entry per rule, keeping the most
/// informative example. Most frequent rules come first.
fn dedupe_grammar(errors: Vec<GrammarErrorDetail>) -> Vec<(GrammarErrorDetail, i64)> {
    let mut deduped: Vec<(GrammarErrorDetail, i64)> = Vec::new();
    for error in errors {
        match deduped.iter_mut().find(|(kept, _)| kept.rule == error.rule) {
            Some((kept, count)) => {
                *count += 1;
                if informativeness(&error) > informativeness(kept) {
                    *kept = error;
                }
            }
            None => deduped.push((error, 1)),
        }
    }
    deduped.sort_by(|a, b| b.1.cmp(&a.1));
    deduped
}

fn informativeness(error: &GrammarErrorDetail) -> usize {
    error.incorrect_text.len() + error.correction.len() + error.explanation.len()
}

/// Collapse pronunciation errors to one entry per phoneme (or word when
/// no phoneme was identified), keeping the worst accuracy and averaging
/// across occurrences. Worst average first.
fn dedupe_pronunciation(
    errors: Vec<PronunciationErrorDetail>,
) -> Vec<(PronunciationErrorDetail, i64, f64)> {
    let mut groups: Vec<(PronunciationErrorDetail, i64, f64)> = Vec::new();
    for error in errors {
        let key_matches = |kept: &PronunciationErrorDetail| match (&kept.phoneme, &error.phoneme) {
            (Some(a), Some(b)) => a == b,
            (None, None) => kept.word == error.word,
            _ => false,
        };
        match groups.iter_mut().find(|(kept, _, _)| key_matches(kept)) {
            Some((kept, count, sum)) => {
                *count += 1;
                *sum += error.accuracy_score;
                if error.accuracy_score < kept.accuracy_score {
                    *kept = error;
                }
            }
            None => {
                let score = error.accuracy_score;
                groups.push((error, 1, score));
            }
        }
    }

    let mut deduped: Vec<(PronunciationErrorDetail, i64, f64)> = groups
        .into_iter()
        .map(|(kept, count, sum)| (kept, count, sum / count as f64))
        .collect();
    deduped.sort_by(|a, b| a.2.total_cmp(&b.2));
    deduped
}

/// Apportion the activity cap; pronunciation gets the larger half when
/// the total overflows.
fn split_cap(grammar: usize, pronunciation: usize, cap: usize) -> (usize, usize) {
    if grammar + pronunciation <= cap {
        return (grammar, pronunciation);
    }
    let pronunciation_take = pronunciation.min(((cap + 1) / 2).max(cap.saturating_sub(grammar)));
    let grammar_take = grammar.min(cap - pronunciation_take);
    (grammar_take, pronunciation_take)
}
