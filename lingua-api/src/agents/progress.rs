//! Progress agent
//!
//! Aggregates stored practice into dashboards, maintains the study
//! streak, and applies the bookkeeping every completed activity
//! triggers (study time, streak, pillar score blend).

use async_trait::async_trait;
use chrono::{Duration, Utc};
use lingua_common::db;
use lingua_common::models::user::{EnglishLevel, User};
use lingua_common::models::Pillar;
use lingua_common::Result;
use serde_json::{json, Value};

use super::{Agent, AgentContext, ConversationState};

/// Completed activity weight in the pillar score blend
const NEW_SCORE_WEIGHT: f64 = 0.3;
/// Each completed speaking session is worth this much pillar score
const SPEAKING_SESSION_VALUE: f64 = 5.0;
/// All pillars at or above this make a beginner level-up ready
const LEVEL_UP_PILLAR_MIN: f64 = 85.0;
/// Pillars under this land in the weekly focus areas
const FOCUS_THRESHOLD: f64 = 70.0;

pub struct ProgressAgent;

#[async_trait]
impl Agent for ProgressAgent {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn description(&self) -> &'static str {
        "Tracks dashboards, streaks, and post-activity bookkeeping"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        // Running as a post-activity edge: apply bookkeeping, keep the
        // pillar agent's response and annotate it.
        if state.activity_output.is_some() {
            return self.after_activity(ctx, state).await;
        }
        // Running after an assessment: attach a fresh overview.
        if state.assessment.final_scores.is_some() {
            let overview = overall_progress(ctx, &state.user).await?;
            if let Value::Object(map) = &mut state.response {
                map.insert("progress".to_string(), overview);
            }
            return Ok(());
        }

        match state.action() {
            "streak" => self.streak(state),
            "weekly_report" => self.weekly_report(ctx, state).await,
            "update" => {
                // Client-reported activity, same bookkeeping path
                state.activity_output = Some(json!({
                    "pillar": state.input_str("pillar"),
                    "score": state.input_f64("score"),
                    "duration_seconds": state.input_i64("duration_seconds").unwrap_or(0),
                }));
                state.response = json!({"type": "progress_updated"});
                self.after_activity(ctx, state).await
            }
            _ => self.dashboard(ctx, state).await,
        }
    }
}

impl ProgressAgent {
    async fn dashboard(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let overview = overall_progress(ctx, &state.user).await?;
        state.record(self.name(), "built dashboard");
        state.response = json!({
            "type": "progress_dashboard",
            "progress": overview,
            "streak": {
                "current_days": state.user.current_streak_days,
                "longest_days": state.user.longest_streak_days,
            },
            "total_study_time_minutes": state.user.total_study_time_minutes,
            "current_level": state.user.current_level,
            "initial_assessment_completed": state.user.initial_assessment_completed,
        });
        Ok(())
    }

    fn streak(&self, state: &mut ConversationState) -> Result<()> {
        let alive = streak_alive(&state.user);
        state.response = json!({
            "type": "streak",
            "current_days": state.user.current_streak_days,
            "longest_days": state.user.longest_streak_days,
            "alive": alive,
            "last_activity_date": state.user.last_activity_date,
        });
        Ok(())
    }

    async fn weekly_report(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let now = Utc::now();
        let user_id = &state.user.id;

        // Per-day speaking activity over the trailing week
        let recent = db::sessions::load_recent_sessions(&ctx.db, user_id, 50).await?;
        let mut days = Vec::with_capacity(7);
        for offset in (0..7).rev() {
            let day = (now - Duration::days(offset)).format("%Y-%m-%d").to_string();
            let sessions = recent
                .iter()
                .filter(|s| s.started_at.format("%Y-%m-%d").to_string() == day)
                .count();
            let minutes: i64 = recent
                .iter()
                .filter(|s| s.started_at.format("%Y-%m-%d").to_string() == day)
                .map(|s| s.duration_seconds / 60)
                .sum();
            days.push(json!({
                "date": day,
                "speaking_sessions": sessions,
                "speaking_minutes": minutes,
            }));
        }

        let (_, words_mastered) = db::vocabulary::progress_counts(&ctx.db, user_id).await?;
        let mut achievements = Vec::new();
        if state.user.current_streak_days >= 7 {
            achievements.push(format!("{}-day study streak", state.user.current_streak_days));
        }
        if words_mastered >= 10 {
            achievements.push(format!("{} words mastered", words_mastered));
        }
        let week_sessions = db::sessions::count_sessions_since(&ctx.db, user_id, now - Duration::days(7)).await?;
        if week_sessions >= 3 {
            achievements.push(format!("{} speaking sessions this week", week_sessions));
        }

        let overview = overall_progress(ctx, &state.user).await?;
        let focus_areas: Vec<&str> = [
            ("vocabulary", overview["vocabulary"].as_f64().unwrap_or(0.0)),
            ("grammar", overview["grammar"].as_f64().unwrap_or(0.0)),
            ("pronunciation", overview["pronunciation"].as_f64().unwrap_or(0.0)),
            ("speaking", overview["speaking"].as_f64().unwrap_or(0.0)),
        ]
        .iter()
        .filter(|(_, score)| *score < FOCUS_THRESHOLD)
        .map(|(pillar, _)| *pillar)
        .collect();

        state.record(self.name(), "built weekly report");
        state.response = json!({
            "type": "weekly_report",
            "days": days,
            "achievements": achievements,
            "focus_areas": focus_areas,
            "progress": overview,
        });
        Ok(())
    }

    /// Bookkeeping after a completed activity: study time, streak,
    /// pillar score blend, and today's goal progress.
    async fn after_activity(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let output = state.activity_output.clone().unwrap_or(Value::Null);
        let duration_seconds = output
            .get("duration_seconds")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            .max(0);
        let minutes = duration_seconds / 60;
        let now = Utc::now();

        update_streak(&mut state.user, now);
        state.user.total_study_time_minutes += minutes;
        state.user.sessions_since_last_assessment += 1;
        state.user.last_activity_date = Some(now);

        if let (Some(pillar), Some(score)) = (
            output.get("pillar").and_then(Value::as_str),
            output.get("score").and_then(Value::as_f64),
        ) {
            blend_pillar_score(&mut state.user, pillar, score);
        }
        state.user.updated_at = now;
        db::users::save_user(&ctx.db, &state.user).await?;

        // Count the activity against today's schedule when one exists
        let date = now.format("%Y-%m-%d").to_string();
        if let Some(mut schedule) = db::schedule::load_schedule(&ctx.db, &state.user.id, &date).await? {
            schedule.daily_goal_progress.minutes_studied += minutes;
            schedule.daily_goal_progress.activities_completed += 1;
            schedule.updated_at = now;
            db::schedule::save_schedule(&ctx.db, &schedule).await?;
        }

        state.record(self.name(), "applied post-activity update");
        if let Value::Object(map) = &mut state.response {
            map.insert(
                "progress_update".to_string(),
                json!({
                    "total_study_time_minutes": state.user.total_study_time_minutes,
                    "current_streak_days": state.user.current_streak_days,
                    "sessions_since_last_assessment": state.user.sessions_since_last_assessment,
                    "pillar_scores": {
                        "vocabulary": state.user.vocabulary_score,
                        "grammar": state.user.grammar_score,
                        "pronunciation": state.user.pronunciation_score,
                        "speaking": state.user.speaking_score,
                    },
                }),
            );
        }
        Ok(())
    }
}

/// Per-pillar progress from stored statistics
pub async fn overall_progress(ctx: &AgentContext, user: &User) -> Result<Value> {
    let user_id = &user.id;

    let (words_practiced, words_mastered) = db::vocabulary::progress_counts(&ctx.db, user_id).await?;
    let (_, grammar_avg) = db::grammar::score_summary(&ctx.db, user_id).await?;
    let (_, _, pronunciation_avg) = db::pronunciation::accuracy_summary(&ctx.db, user_id).await?;
    let (sessions_total, _) = db::sessions::session_counts(&ctx.db, user_id).await?;

    let vocabulary = if words_practiced > 0 {
        words_mastered as f64 / words_practiced as f64 * 100.0
    } else {
        0.0
    };
    let speaking = (sessions_total as f64 * SPEAKING_SESSION_VALUE).min(100.0);
    let overall = (vocabulary + grammar_avg + pronunciation_avg + speaking) / 4.0;

    let pillars = [
        (Pillar::Vocabulary, vocabulary),
        (Pillar::Grammar, grammar_avg),
        (Pillar::Pronunciation, pronunciation_avg),
        (Pillar::Speaking, speaking),
    ];
    let weakest = pillars
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(pillar, _)| *pillar)
        .unwrap_or(Pillar::Vocabulary);

    let level_up_ready = user.current_level == EnglishLevel::Beginner
        && pillars.iter().all(|(_, score)| *score >= LEVEL_UP_PILLAR_MIN);

    Ok(json!({
        "vocabulary": vocabulary,
        "grammar": grammar_avg,
        "pronunciation": pronunciation_avg,
        "speaking": speaking,
        "overall": overall,
        "weakest_pillar": weakest,
        "level_up_ready": level_up_ready,
        "words_practiced": words_practiced,
        "words_mastered": words_mastered,
        "speaking_sessions": sessions_total,
    }))
}

/// The streak survives if the last activity was today or yesterday
fn streak_alive(user: &User) -> bool {
    match user.last_activity_date {
        Some(last) => {
            let days = (Utc::now().date_naive() - last.date_naive()).num_days();
            days <= 1
        }
        None => false,
    }
}

/// Same day keeps the streak, yesterday extends it, a gap resets it
fn update_streak(user: &mut User, now: chrono::DateTime<Utc>) {
    let today = now.date_naive();
    match user.last_activity_date {
        Some(last) => {
            let days = (today - last.date_naive()).num_days();
            if days == 1 {
                user.current_streak_days += 1;
                user.longest_streak_days = user.longest_streak_days.max(user.current_streak_days);
            } else if days > 1 {
                user.current_streak_days = 1;
            }
        }
        None => {
            user.current_streak_days = 1;
            user.longest_streak_days = user.longest_streak_days.max(1);
        }
    }
}

/// Exponential blend of an activity score into the stored pillar score
fn blend_pillar_score(user: &mut User, pillar: &str, score: f64) {
    let blended = |old: f64| old * (1.0 - NEW_SCORE_WEIGHT) + score * NEW_SCORE_WEIGHT;
    match pillar {
        "vocabulary" => user.vocabulary_score = blended(user.vocabulary_score),
        "grammar" => user.grammar_score = blended(user.grammar_score),
        "pronunciation" => user.pronunciation_score = blended(user.pronunciation_score),
        "speaking" => user.speaking_score = blended(user.speaking_score),
        other => tracing::warn!(pillar = other, "Unknown pillar in activity output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        )
    }

    #[test]
    fn first_activity_starts_the_streak() {
        let mut user = test_user();
        update_streak(&mut user, Utc::now());
        assert_eq!(user.current_streak_days, 1);
        assert_eq!(user.longest_streak_days, 1);
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let mut user = test_user();
        user.current_streak_days = 4;
        user.longest_streak_days = 4;
        user.last_activity_date = Some(Utc::now() - Duration::days(1));
        update_streak(&mut user, Utc::now());
        assert_eq!(user.current_streak_days, 5);
        assert_eq!(user.longest_streak_days, 5);
    }

    #[test]
    fn same_day_activity_keeps_the_streak() {
        let mut user = test_user();
        user.current_streak_days = 3;
        user.last_activity_date = Some(Utc::now());
        update_streak(&mut user, Utc::now());
        assert_eq!(user.current_streak_days, 3);
    }

    #[test]
    fn a_gap_resets_the_streak_but_keeps_the_record() {
        let mut user = test_user();
        user.current_streak_days = 9;
        user.longest_streak_days = 9;
        user.last_activity_date = Some(Utc::now() - Duration::days(3));
        update_streak(&mut user, Utc::now());
        assert_eq!(user.current_streak_days, 1);
        assert_eq!(user.longest_streak_days, 9);
    }

    #[test]
    fn pillar_blend_weights_the_old_score_heavier() {
        let mut user = test_user();
        user.grammar_score = 80.0;
        blend_pillar_score(&mut user, "grammar", 100.0);
        assert!((user.grammar_score - 86.0).abs() < 1e-9);
        // other pillars untouched
        assert_eq!(user.vocabulary_score, 0.0);
    }

    #[test]
    fn streak_alive_tolerates_yesterday_only() {
        let mut user = test_user();
        assert!(!streak_alive(&user));
        user.last_activity_date = Some(Utc::now() - Duration::days(1));
        assert!(streak_alive(&user));
        user.last_activity_date = Some(Utc::now() - Duration::days(2));
        assert!(!streak_alive(&user));
    }
}
