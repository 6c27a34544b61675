//! Pronunciation agent
//!
//! Selects the next phonetic sound to practice (sounds absent from
//! Portuguese get priority), synthesizes reference audio, and runs
//! submitted recordings through pronunciation assessment. SRS state
//! advances when an exercise completes: a pass, or three attempts.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use lingua_common::db;
use lingua_common::models::pronunciation::{PhoneticSound, PronunciationAttempt, PronunciationProgress};
use lingua_common::models::speaking::PronunciationErrorDetail;
use lingua_common::models::user::EnglishLevel;
use lingua_common::srs;
use lingua_common::{Error, Result};
use serde_json::json;

use super::{Agent, AgentContext, ConversationState};

/// Accuracy required to pass an exercise
pub const PASSING_ACCURACY: f64 = 70.0;
/// Attempts allowed per exercise
pub const MAX_ATTEMPTS: i64 = 3;
/// Average accuracy and practice count required for mastery
const MASTERY_ACCURACY: f64 = 85.0;
const MASTERY_PRACTICE_COUNT: i64 = 3;
/// Recent-accuracy window feeding the running average
const RECENT_WINDOW: usize = 10;
/// Attempt history cap
const HISTORY_CAP: usize = 20;

pub struct PronunciationAgent;

#[async_trait]
impl Agent for PronunciationAgent {
    fn name(&self) -> &'static str {
        "pronunciation"
    }

    fn description(&self) -> &'static str {
        "Runs phoneme-focused pronunciation exercises with speech assessment"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        match state.action() {
            "submit_audio" => self.submit_audio(ctx, state).await,
            "progress" => self.progress_overview(ctx, state).await,
            _ => self.next_exercise(ctx, state).await,
        }
    }
}

impl PronunciationAgent {
    async fn next_exercise(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let sound = select_sound(ctx, state).await?;
        let progress = db::pronunciation::load_progress(&ctx.db, &state.user.id, &sound.id).await?;
        let target_word = pick_target_word(&sound, progress.as_ref());

        // Reference audio is best effort; the exercise still works from text
        let reference_audio = match ctx
            .speech
            .synthesize(&target_word, &state.user.profile.voice_preference)
            .await
        {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(err) => {
                tracing::warn!(sound = %sound.id, error = %err, "Reference TTS failed");
                None
            }
        };

        state.record(self.name(), format!("exercise for sound {}", sound.id));
        state.response = json!({
            "type": "pronunciation_exercise",
            "sound": {
                "id": sound.id,
                "phoneme": sound.phoneme,
                "name": sound.name,
                "difficulty": sound.difficulty,
            },
            "target_word": target_word,
            "reference_audio": reference_audio,
            "instructions_pt": instructions_pt(&sound),
            "attempts_remaining": MAX_ATTEMPTS,
            "passing_accuracy": PASSING_ACCURACY,
        });
        Ok(())
    }

    async fn submit_audio(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let sound_id = state
            .input_str("sound_id")
            .ok_or_else(|| Error::InvalidInput("sound_id is required".to_string()))?
            .to_string();
        let word = state
            .input_str("word")
            .ok_or_else(|| Error::InvalidInput("word is required".to_string()))?
            .to_string();
        let attempt_number = state.input_i64("attempt_number").unwrap_or(1).clamp(1, MAX_ATTEMPTS);

        let audio = decode_audio(state, ctx.settings.max_audio_bytes)?;

        let sound = db::pronunciation::load_sound(&ctx.db, &sound_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Sound {}", sound_id)))?;

        let assessment = ctx.speech.assess_pronunciation(&audio, &word).await?;
        let accuracy = assessment.accuracy_score;
        let passed = accuracy >= PASSING_ACCURACY;
        let exercise_complete = passed || attempt_number >= MAX_ATTEMPTS;

        let mut progress = db::pronunciation::load_progress(&ctx.db, &state.user.id, &sound_id)
            .await?
            .unwrap_or_else(|| PronunciationProgress::new(&state.user.id, &sound_id, &sound.phoneme));

        let now = Utc::now();
        progress.practice_count += 1;
        progress.recent_accuracies.push(accuracy);
        if progress.recent_accuracies.len() > RECENT_WINDOW {
            let excess = progress.recent_accuracies.len() - RECENT_WINDOW;
            progress.recent_accuracies.drain(..excess);
        }
        progress.average_accuracy = progress.recent_accuracies.iter().sum::<f64>()
            / progress.recent_accuracies.len() as f64;
        progress.best_accuracy = progress.best_accuracy.max(accuracy);
        progress.practice_history.push(PronunciationAttempt {
            timestamp: now,
            word: word.clone(),
            recognized_text: assessment.recognized_text.clone(),
            accuracy_score: accuracy,
        });
        if progress.practice_history.len() > HISTORY_CAP {
            let excess = progress.practice_history.len() - HISTORY_CAP;
            progress.practice_history.drain(..excess);
        }
        progress.last_practiced = Some(now);
        progress.mastered = progress.average_accuracy >= MASTERY_ACCURACY
            && progress.practice_count >= MASTERY_PRACTICE_COUNT;
        progress.needs_mouth_position_review = progress.average_accuracy < PASSING_ACCURACY;

        if exercise_complete {
            let quality = quality_from_pronunciation_accuracy(accuracy);
            progress.srs = srs::apply_review(&progress.srs, quality);
        }
        progress.updated_at = now;
        db::pronunciation::save_progress(&ctx.db, &progress).await?;

        // A completed-but-failed exercise feeds corrective practice
        if exercise_complete && !passed {
            state.errors.pronunciation.push(PronunciationErrorDetail {
                word: word.clone(),
                phoneme: Some(sound.phoneme.clone()),
                accuracy_score: accuracy,
                turn_number: 0,
            });
        }

        let guidance = if passed { None } else { Some(guidance_for(&sound)) };

        state.record(
            self.name(),
            format!(
                "attempt {}/{} for {} accuracy {:.0}",
                attempt_number, MAX_ATTEMPTS, sound_id, accuracy
            ),
        );
        if exercise_complete {
            state.activity_output = Some(json!({
                "pillar": "pronunciation",
                "score": accuracy,
                "duration_seconds": 45,
            }));
        }
        state.response = json!({
            "type": "pronunciation_assessment",
            "sound_id": sound_id,
            "word": word,
            "assessment": assessment,
            "passed": passed,
            "exercise_complete": exercise_complete,
            "attempts_remaining": (MAX_ATTEMPTS - attempt_number).max(0),
            "guidance": guidance,
            "mastered": progress.mastered,
            "average_accuracy": progress.average_accuracy,
        });
        Ok(())
    }

    async fn progress_overview(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let all = db::pronunciation::load_all_progress(&ctx.db, &state.user.id).await?;
        let (total, mastered, average) =
            db::pronunciation::accuracy_summary(&ctx.db, &state.user.id).await?;

        let practiced: Vec<_> = all.iter().filter(|p| p.practice_count > 0).collect();
        let needs_work = practiced
            .iter()
            .filter(|p| p.average_accuracy < PASSING_ACCURACY)
            .count();
        let hardest = practiced
            .iter()
            .min_by(|a, b| a.average_accuracy.total_cmp(&b.average_accuracy))
            .map(|p| p.phoneme.clone());
        let best = practiced
            .iter()
            .max_by(|a, b| a.average_accuracy.total_cmp(&b.average_accuracy))
            .map(|p| p.phoneme.clone());

        state.response = json!({
            "type": "pronunciation_progress",
            "sounds_practiced": total,
            "sounds_mastered": mastered,
            "sounds_needing_work": needs_work,
            "average_accuracy": average,
            "hardest_sound": hardest,
            "best_sound": best,
            "sounds": all,
        });
        Ok(())
    }
}

/// Sound selection: requested id, SRS due, weak accuracy, then new
/// sounds (absent-from-Portuguese first, easiest-first for beginners).
async fn select_sound(ctx: &AgentContext, state: &ConversationState) -> Result<PhoneticSound> {
    if let Some(sound_id) = state.input_str("sound_id") {
        return db::pronunciation::load_sound(&ctx.db, sound_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Sound {}", sound_id)));
    }

    let now = Utc::now();
    let user_id = &state.user.id;

    let due = db::pronunciation::load_due_sounds(&ctx.db, user_id, now, 1).await?;
    if let Some(progress) = due.first() {
        if let Some(sound) = db::pronunciation::load_sound(&ctx.db, &progress.sound_id).await? {
            return Ok(sound);
        }
    }

    let weak = db::pronunciation::load_needs_practice(&ctx.db, user_id, PASSING_ACCURACY, 1).await?;
    if let Some(progress) = weak.first() {
        if let Some(sound) = db::pronunciation::load_sound(&ctx.db, &progress.sound_id).await? {
            return Ok(sound);
        }
    }

    let mut unpracticed = db::pronunciation::load_unpracticed_sounds(&ctx.db, user_id).await?;
    order_new_sounds(&mut unpracticed, state.user.current_level);
    unpracticed
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound("No phonetic sounds left to practice".to_string()))
}

/// Absent-from-Portuguese sounds first; beginners get easier sounds first.
fn order_new_sounds(sounds: &mut [PhoneticSound], level: EnglishLevel) {
    sounds.sort_by_key(|s| {
        let difficulty = match level {
            EnglishLevel::Beginner => s.difficulty.rank(),
            // Intermediates take the hard sounds head-on
            EnglishLevel::Intermediate => 2 - s.difficulty.rank(),
        };
        (s.exists_in_portuguese, difficulty, s.id.clone())
    });
}

/// First example word the user has not yet attempted
fn pick_target_word(sound: &PhoneticSound, progress: Option<&PronunciationProgress>) -> String {
    let practiced: Vec<&str> = progress
        .map(|p| p.practice_history.iter().map(|a| a.word.as_str()).collect())
        .unwrap_or_default();

    sound
        .example_words
        .iter()
        .find(|w| !practiced.contains(&w.as_str()))
        .or_else(|| sound.example_words.first())
        .cloned()
        .unwrap_or_else(|| sound.phoneme.clone())
}

/// Map accuracy to an SM-2 grade. Pronunciation is harsher at the low
/// end than the shared mapping: below 30 counts as a blackout.
fn quality_from_pronunciation_accuracy(accuracy: f64) -> i32 {
    if accuracy >= 95.0 {
        5
    } else if accuracy >= 85.0 {
        4
    } else if accuracy >= 70.0 {
        3
    } else if accuracy >= 50.0 {
        2
    } else if accuracy >= 30.0 {
        1
    } else {
        0
    }
}

/// Articulation guidance shown after a failed attempt
pub(crate) fn guidance_for(sound: &PhoneticSound) -> serde_json::Value {
    json!({
        "phoneme": sound.phoneme,
        "mouth_position": sound.mouth_position,
        "common_mistake": sound.common_mistake,
        "tip": sound.tip,
        "portuguese_similar": sound.portuguese_similar,
    })
}

/// Portuguese-language exercise instructions
fn instructions_pt(sound: &PhoneticSound) -> String {
    format!(
        "Ouça o áudio de referência e repita a palavra em voz alta, \
         prestando atenção ao som {} ({}). Dica: {}",
        sound.phoneme, sound.name, sound.tip
    )
}

fn decode_audio(state: &ConversationState, max_bytes: usize) -> Result<Vec<u8>> {
    let encoded = state
        .input_str("audio")
        .ok_or_else(|| Error::InvalidInput("audio is required".to_string()))?;

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
    use lingua_common::models::pronunciation::{MouthPosition, SoundDifficulty};
    use serde_json::json;

    fn sound(id: &str, exists_in_pt: bool, difficulty: SoundDifficulty) -> PhoneticSound {
        PhoneticSound {
            id: id.to_string(),
            phoneme: "θ".to_string(),
            name: "test".to_string(),
            exists_in_portuguese: exists_in_pt,
            difficulty,
            mouth_position: MouthPosition {
                tongue: "t".to_string(),
                lips: "l".to_string(),
                teeth: None,
                airflow: None,
                voicing: None,
            },
            example_words: vec!["think".to_string(), "three".to_string()],
            common_mistake: "t for th".to_string(),
            portuguese_similar: None,
            tip: "bite the tongue".to_string(),
        }
    }

    #[test]
    fn new_sound_order_prioritizes_missing_portuguese_sounds() {
        let mut sounds = vec![
            sound("a_exists", true, SoundDifficulty::Low),
            sound("b_absent_hard", false, SoundDifficulty::High),
            sound("c_absent_easy", false, SoundDifficulty::Low),
        ];
        order_new_sounds(&mut sounds, EnglishLevel::Beginner);
        assert_eq!(sounds[0].id, "c_absent_easy");
        assert_eq!(sounds[1].id, "b_absent_hard");
        assert_eq!(sounds[2].id, "a_exists");

        order_new_sounds(&mut sounds, EnglishLevel::Intermediate);
        assert_eq!(sounds[0].id, "b_absent_hard");
    }

    #[test]
    fn target_word_skips_practiced_words() {
        let s = sound("s1", false, SoundDifficulty::High);
        let mut progress = PronunciationProgress::new("u1", "s1", "θ");
        progress.practice_history.push(PronunciationAttempt {
            timestamp: Utc::now(),
            word: "think".to_string(),
            recognized_text: "tink".to_string(),
            accuracy_score: 55.0,
        });
        assert_eq!(pick_target_word(&s, Some(&progress)), "three");
        assert_eq!(pick_target_word(&s, None), "think");
    }

    #[test]
    fn pronunciation_quality_band_at_thirty() {
        assert_eq!(quality_from_pronunciation_accuracy(96.0), 5);
        assert_eq!(quality_from_pronunciation_accuracy(85.0), 4);
        assert_eq!(quality_from_pronunciation_accuracy(70.0), 3);
        assert_eq!(quality_from_pronunciation_accuracy(50.0), 2);
        assert_eq!(quality_from_pronunciation_accuracy(30.0), 1);
        assert_eq!(quality_from_pronunciation_accuracy(29.9), 0);
    }

    #[test]
    fn audio_decoding_enforces_size_limit() {
        let user = lingua_common::models::user::User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        let encoded = BASE64.encode(vec![0u8; 64]);
        let state = ConversationState::new(
            "pronunciation_exercise",
            user,
            json!({"audio": encoded}),
        );
        assert!(decode_audio(&state, 1024).is_ok());
        assert!(matches!(decode_audio(&state, 16), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn missing_audio_is_invalid_input() {
        let user = lingua_common::models::user::User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        let state = ConversationState::new("pronunciation_exercise", user, json!({}));
        assert!(matches!(decode_audio(&state, 1024), Err(Error::InvalidInput(_))));
    }
}
