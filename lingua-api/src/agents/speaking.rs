//! Speaking agent
//!
//! Free conversation practice: picks a topic, speaks first, and keeps
//! the exchange going turn by turn. User turns submitted as audio run
//! through STT and pronunciation assessment; every user turn runs
//! through grammar error detection. Detected errors accumulate on the
//! session and feed corrective activities when it ends.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use lingua_common::db;
use lingua_common::models::speaking::{
    ConversationTopic, PronunciationErrorDetail, SessionStatus, SessionSummary, SpeakingSession,
};
use lingua_common::models::user::EnglishLevel;
use lingua_common::models::Difficulty;
use lingua_common::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

use super::pronunciation::PASSING_ACCURACY;
use super::{Agent, AgentContext, ConversationState};

/// Sessions shorter than this get gentler feedback
pub const MIN_VALID_TURNS: i64 = 3;
/// The agent starts suggesting a wrap-up at this many turns
pub const SUGGEST_END_AT_TURNS: i64 = 15;
/// How often intermediate users get an intermediate-or-harder topic
const INTERMEDIATE_TOPIC_PREFERENCE: f64 = 0.7;

pub struct SpeakingAgent;

#[async_trait]
impl Agent for SpeakingAgent {
    fn name(&self) -> &'static str {
        "speaking"
    }

    fn description(&self) -> &'static str {
        "Runs free conversation sessions with live error detection"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        match state.action() {
            "turn" => self.turn(ctx, state).await,
            "end" => self.end(ctx, state).await,
            _ => self.start(ctx, state).await,
        }
    }
}

impl SpeakingAgent {
    async fn start(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        // One active session at a time; resume instead of stacking
        if let Some(existing) = db::sessions::load_active_session(&ctx.db, &state.user.id).await? {
            state.speaking.session_id = Some(existing.id.clone());
            state.speaking.turn_count = existing.current_turn;
            state.response = json!({
                "type": "speaking_session_resumed",
                "session": existing,
            });
            return Ok(());
        }

        let topic = select_topic(ctx, state).await?;
        let mut session = SpeakingSession::new(&state.user.id, &topic);

        let opening = topic
            .opening_prompts
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| format!("Hi! Let's talk about {}.", topic.name));

        let opening_audio = self.tts_best_effort(ctx, state, &opening).await;
        session.push_exchange("agent", opening.clone(), opening_audio.is_some());
        db::sessions::save_session(&ctx.db, &session).await?;

        let beginner_help = if state.user.current_level == EnglishLevel::Beginner {
            Some(json!({
                "suggested_responses": topic.sample_questions,
                "vocabulary_hints": topic.vocabulary_hints,
            }))
        } else {
            None
        };

        state.speaking.session_id = Some(session.id.clone());
        state.speaking.turn_count = session.current_turn;
        state.record(self.name(), format!("started session {} on {}", session.id, topic.id));
        state.response = json!({
            "type": "speaking_session_started",
            "session_id": session.id,
            "topic": {
                "id": topic.id,
                "name": topic.name,
                "name_pt": topic.name_pt,
                "difficulty": topic.difficulty,
            },
            "agent_message": opening,
            "agent_audio": opening_audio,
            "beginner_help": beginner_help,
        });
        Ok(())
    }

    async fn turn(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let Some(mut session) = self.load_requested_session(ctx, state).await? else {
            state.response = json!({
                "type": "session_ended",
                "message": "No active speaking session. Start a new one.",
            });
            return Ok(());
        };

        // Resolve the user's turn: transcribe audio when submitted
        let (user_text, confidence) = match state.input_str("audio") {
            Some(encoded) => {
                let audio = decode_audio(encoded, ctx.settings.max_audio_bytes)?;
                let transcription = ctx.speech.recognize(&audio).await?;
                self.assess_user_audio(ctx, &mut session, &audio, &transcription.text).await;
                (transcription.text, Some(transcription.confidence))
            }
            None => {
                let text = state
                    .input_str("text")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| Error::InvalidInput("text or audio is required".to_string()))?;
                (text.to_string(), None)
            }
        };

        let turn_number = session.push_exchange("user", user_text.clone(), false);
        if let Some(conf) = confidence {
            if let Some(exchange) = session.exchanges.last_mut() {
                exchange.transcription_confidence = Some(conf);
            }
        }

        // Grammar detection is best effort; a turn never fails because of it
        let mut turn_grammar_errors = match ctx.llm.detect_grammar_errors(&user_text).await {
            Ok(errors) => errors,
            Err(err) => {
                tracing::warn!(session = %session.id, error = %err, "Grammar detection failed");
                Vec::new()
            }
        };
        for error in &mut turn_grammar_errors {
            error.turn_number = turn_number;
        }
        session.grammar_errors.extend(turn_grammar_errors.iter().cloned());

        let history: Vec<(String, String)> = session
            .exchanges
            .iter()
            .map(|e| (e.speaker.clone(), e.text.clone()))
            .collect();
        let mut reply = match ctx
            .llm
            .conversation_reply(&session.topic_name, &history, &user_text, state.user.current_level)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(session = %session.id, error = %err, "Conversation reply failed, using canned prompt");
                "That's interesting! Can you tell me more about that?".to_string()
            }
        };

        let suggest_end = session.current_turn >= SUGGEST_END_AT_TURNS;
        if suggest_end {
            reply.push_str(" We've been talking for a while. Shall we wrap up the session?");
        }

        let reply_audio = self.tts_best_effort(ctx, state, &reply).await;
        session.push_exchange("agent", reply.clone(), reply_audio.is_some());
        session.updated_at = Utc::now();
        db::sessions::save_session(&ctx.db, &session).await?;

        state.speaking.session_id = Some(session.id.clone());
        state.speaking.turn_count = session.current_turn;
        state.record(self.name(), format!("turn {} in {}", turn_number, session.id));
        state.response = json!({
            "type": "speaking_turn",
            "session_id": session.id,
            "turn_number": turn_number,
            "user_text": user_text,
            "transcription_confidence": confidence,
            "agent_message": reply,
            "agent_audio": reply_audio,
            "grammar_errors": turn_grammar_errors,
            "suggest_end": suggest_end,
        });
        Ok(())
    }

    async fn end(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let Some(mut session) = self.load_requested_session(ctx, state).await? else {
            state.response = json!({
                "type": "session_ended",
                "message": "No active speaking session to end.",
            });
            return Ok(());
        };

        let now = Utc::now();
        session.status = SessionStatus::Completed;
        session.ended_at = Some(now);
        session.duration_seconds = (now - session.started_at).num_seconds().max(0);

        let summary = summarize(&session);
        session.summary = Some(summary.clone());
        session.updated_at = now;
        db::sessions::save_session(&ctx.db, &session).await?;

        // Hand detected errors to the error-integration agent
        state.errors.grammar.extend(session.grammar_errors.iter().cloned());
        state.errors.pronunciation.extend(session.pronunciation_errors.iter().cloned());

        state.speaking.session_id = Some(session.id.clone());
        state.speaking.turn_count = session.current_turn;
        state.speaking.session_ended = true;

        state.record(self.name(), format!("ended session {}", session.id));
        state.activity_output = Some(json!({
            "pillar": "speaking",
            "score": session_score(&summary),
            "duration_seconds": session.duration_seconds,
        }));
        state.response = json!({
            "type": "speaking_session_summary",
            "session_id": session.id,
            "duration_seconds": session.duration_seconds,
            "summary": summary,
        });
        Ok(())
    }

    /// Session named in the payload, or the user's active session
    async fn load_requested_session(
        &self,
        ctx: &AgentContext,
        state: &ConversationState,
    ) -> Result<Option<SpeakingSession>> {
        let session = match state.input_str("session_id") {
            Some(session_id) => db::sessions::load_session(&ctx.db, &state.user.id, session_id).await?,
            None => db::sessions::load_active_session(&ctx.db, &state.user.id).await?,
        };
        Ok(session.filter(|s| s.status == SessionStatus::Active))
    }

    /// Record per-word pronunciation misses from a user audio turn
    async fn assess_user_audio(
        &self,
        ctx: &AgentContext,
        session: &mut SpeakingSession,
        audio: &[u8],
        transcript: &str,
    ) {
        if transcript.is_empty() {
            return;
        }
        match ctx.speech.assess_pronunciation(audio, transcript).await {
            Ok(assessment) => {
                let turn = session.current_turn + 1;
                for word in assessment.words {
                    if word.accuracy_score < PASSING_ACCURACY {
                        let phoneme = word
                            .phonemes
                            .iter()
                            .min_by(|a, b| a.accuracy_score.total_cmp(&b.accuracy_score))
                            .map(|p| p.phoneme.clone());
                        session.pronunciation_errors.push(PronunciationErrorDetail {
                            word: word.word,
                            phoneme,
                            accuracy_score: word.accuracy_score,
                            turn_number: turn,
                        });
                    }
                }
            }
            Err(err) => {
                tracing::warn!(session = %session.id, error = %err, "Turn pronunciation assessment failed");
            }
        }
    }

    async fn tts_best_effort(
        &self,
        ctx: &AgentContext,
        state: &ConversationState,
        text: &str,
    ) -> Option<String> {
        match ctx
            .speech
            .synthesize(text, &state.user.profile.voice_preference)
            .await
        {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(err) => {
                tracing::warn!(error = %err, "Agent speech synthesis failed");
                None
            }
        }
    }
}

/// Topic selection: beginners only get beginner topics; intermediate
/// users get an intermediate-or-harder topic 70% of the time.
async fn select_topic(ctx: &AgentContext, state: &ConversationState) -> Result<ConversationTopic> {
    if let Some(topic_id) = state.input_str("topic_id") {
        return db::sessions::load_topic(&ctx.db, topic_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Topic {}", topic_id)));
    }

    let pool = match state.user.current_level {
        EnglishLevel::Beginner => db::sessions::list_topics(&ctx.db, Some("beginner")).await?,
        EnglishLevel::Intermediate => {
            let all = db::sessions::list_topics(&ctx.db, None).await?;
            let harder: Vec<_> = all
                .iter()
                .filter(|t| t.difficulty != Difficulty::Beginner)
                .cloned()
                .collect();
            if !harder.is_empty() && rand::thread_rng().gen_bool(INTERMEDIATE_TOPIC_PREFERENCE) {
                harder
            } else {
                all
            }
        }
    };

    pool.choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| Error::NotFound("No conversation topics available".to_string()))
}

/// Build the end-of-session summary
fn summarize(session: &SpeakingSession) -> SessionSummary {
    let user_turns = session
        .exchanges
        .iter()
        .filter(|e| e.speaker == "user")
        .count() as i64;

    let mut rules: Vec<String> = session
        .grammar_errors
        .iter()
        .map(|e| e.rule.clone())
        .collect();
    rules.sort();
    rules.dedup();

    let mut phonemes: Vec<String> = session
        .pronunciation_errors
        .iter()
        .filter_map(|e| e.phoneme.clone())
        .collect();
    phonemes.sort();
    phonemes.dedup();

    let feedback = if user_turns < MIN_VALID_TURNS {
        "A short session — try to keep the conversation going a bit longer next time.".to_string()
    } else if session.grammar_errors.is_empty() && session.pronunciation_errors.is_empty() {
        "Great session! No recurring errors detected.".to_string()
    } else {
        format!(
            "Good session. {} grammar point(s) and {} pronunciation target(s) were added to your practice queue.",
            rules.len(),
            phonemes.len()
        )
    };

    SessionSummary {
        total_turns: session.exchanges.len() as i64,
        user_turns,
        grammar_error_count: session.grammar_errors.len() as i64,
        pronunciation_error_count: session.pronunciation_errors.len() as i64,
        grammar_rules_violated: rules,
        problematic_phonemes: phonemes,
        feedback,
    }
}

/// Session score fed to the pillar blend: start from 100 and deduct per
/// distinct problem, floored at 40 for any valid-length session.
fn session_score(summary: &SessionSummary) -> f64 {
    if summary.user_turns < MIN_VALID_TURNS {
        return 50.0;
    }
    let deductions = (summary.grammar_rules_violated.len() + summary.problematic_phonemes.len()) as f64 * 5.0;
    (100.0 - deductions).max(40.0)
}

fn decode_audio(encoded: &str, max_bytes: usize) -> Result<Vec<u8>> {
    let audio = BASE64
        .decode(encoded)
        .map_err(|e| Error::InvalidInput(format!("Invalid base64 audio: {}", e)))?;
    if audio.len() > max_bytes {
        return Err(Error::InvalidInput(format!(
            "Audio payload exceeds {} bytes",
            max_bytes
        )));
    }
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_common::models::speaking::GrammarErrorDetail;

    fn topic() -> ConversationTopic {
        ConversationTopic {
            id: "topic_test".to_string(),
            name: "Daily routine".to_string(),
            name_pt: "Rotina diária".to_string(),
            description: String::new(),
            description_pt: String::new(),
            difficulty: Difficulty::Beginner,
            category: "personal".to_string(),
            sample_questions: vec![],
            vocabulary_hints: vec![],
            opening_prompts: vec!["Hi!".to_string()],
        }
    }

    fn session_with_errors() -> SpeakingSession {
        let mut session = SpeakingSession::new("u1", &topic());
        for i in 0..4 {
            session.push_exchange("agent", format!("agent turn {}", i), false);
            session.push_exchange("user", format!("user turn {}", i), false);
        }
        session.grammar_errors.push(GrammarErrorDetail {
            rule: "articles".to_string(),
            incorrect_text: "I am engineer".to_string(),
            correction: "I am an engineer".to_string(),
            explanation: "Professions take an article".to_string(),
            turn_number: 2,
        });
        session.grammar_errors.push(GrammarErrorDetail {
            rule: "articles".to_string(),
            incorrect_text: "She is teacher".to_string(),
            correction: "She is a teacher".to_string(),
            explanation: "Professions take an article".to_string(),
            turn_number: 4,
        });
        session.pronunciation_errors.push(PronunciationErrorDetail {
            word: "think".to_string(),
            phoneme: Some("θ".to_string()),
            accuracy_score: 52.0,
            turn_number: 4,
        });
        session
    }

    #[test]
    fn summary_deduplicates_rules_and_phonemes() {
        let summary = summarize(&session_with_errors());
        assert_eq!(summary.total_turns, 8);
        assert_eq!(summary.user_turns, 4);
        assert_eq!(summary.grammar_error_count, 2);
        assert_eq!(summary.grammar_rules_violated, vec!["articles".to_string()]);
        assert_eq!(summary.problematic_phonemes, vec!["θ".to_string()]);
    }

    #[test]
    fn short_sessions_get_gentle_feedback_and_neutral_score() {
        let mut session = SpeakingSession::new("u1", &topic());
        session.push_exchange("agent", "Hi!".to_string(), false);
        session.push_exchange("user", "Hello".to_string(), false);
        let summary = summarize(&session);
        assert!(summary.feedback.contains("short session"));
        assert_eq!(session_score(&summary), 50.0);
    }

    #[test]
    fn session_score_deducts_per_distinct_problem() {
        let summary = summarize(&session_with_errors());
        // one rule + one phoneme = 10 points off
        assert_eq!(session_score(&summary), 90.0);
    }

    #[test]
    fn session_score_is_floored() {
        let mut session = session_with_errors();
        for i in 0..20 {
            session.grammar_errors.push(GrammarErrorDetail {
                rule: format!("rule_{}", i),
                incorrect_text: String::new(),
                correction: String::new(),
                explanation: String::new(),
                turn_number: 1,
            });
        }
        assert_eq!(session_score(&summarize(&session)), 40.0);
    }
}
