//! Scheduler agent
//!
//! Owns the spaced-repetition view of the user's day: refreshes the SRS
//! summary, lays out a daily schedule that fits the study goal, and
//! picks the single next activity on demand.

use async_trait::async_trait;
use chrono::Utc;
use lingua_common::db;
use lingua_common::models::progress::{DailySchedule, ScheduledReview};
use lingua_common::models::Pillar;
use lingua_common::srs::{review_priority, ReviewPriority};
use lingua_common::Result;
use serde_json::json;

use super::state::{SrsItem, SrsSummary};
use super::{Agent, AgentContext, ConversationState};

/// Per-item time estimates in minutes
pub const VOCABULARY_MINUTES: i64 = 2;
pub const GRAMMAR_MINUTES: i64 = 5;
pub const PRONUNCIATION_MINUTES: i64 = 3;
pub const SPEAKING_MINUTES: i64 = 10;

/// Per-pillar item caps for one day's schedule
const MAX_VOCABULARY_REVIEWS: i64 = 10;
const MAX_GRAMMAR_REVIEWS: i64 = 5;
const MAX_PRONUNCIATION_REVIEWS: i64 = 5;
const MAX_LOW_FREQUENCY_REVIEWS: i64 = 5;

/// Sounds below this average accuracy fill spare pronunciation slots
const NEEDS_PRACTICE_ACCURACY: f64 = 80.0;

pub struct SchedulerAgent;

#[async_trait]
impl Agent for SchedulerAgent {
    fn name(&self) -> &'static str {
        "scheduler"
    }

    fn description(&self) -> &'static str {
        "Builds daily schedules and picks the next activity from SRS state"
    }

    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()> {
        let summary = refresh_summary(ctx, &state.user.id).await?;
        state.srs_summary = Some(summary.clone());

        match state.request_type.as_str() {
            "get_next_activity" => self.next_activity(ctx, state, &summary).await,
            _ => self.schedule(ctx, state, &summary).await,
        }
    }
}

impl SchedulerAgent {
    async fn schedule(
        &self,
        ctx: &AgentContext,
        state: &mut ConversationState,
        summary: &SrsSummary,
    ) -> Result<()> {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let schedule = match db::schedule::load_schedule(&ctx.db, &state.user.id, &date).await? {
            Some(existing) => existing,
            None => {
                let built = build_schedule(ctx, state, &date).await?;
                db::schedule::save_schedule(&ctx.db, &built).await?;
                state.record(
                    self.name(),
                    format!("built schedule with {} items", built.scheduled_reviews.len()),
                );
                built
            }
        };

        state.response = json!({
            "type": "daily_schedule",
            "schedule": schedule,
            "due_counts": {
                "vocabulary": summary.vocabulary_due,
                "grammar": summary.grammar_due,
                "pronunciation": summary.pronunciation_due,
            },
        });
        Ok(())
    }

    async fn next_activity(
        &self,
        ctx: &AgentContext,
        state: &mut ConversationState,
        summary: &SrsSummary,
    ) -> Result<()> {
        // Corrective work from detected errors always comes first
        let pending = db::activities::load_pending(&ctx.db, &state.user.id, None, 1).await?;
        if let Some(activity) = pending.into_iter().next() {
            state.record(self.name(), format!("next: corrective activity {}", activity.id));
            state.response = json!({
                "type": "next_activity",
                "source": "corrective",
                "activity": activity,
            });
            return Ok(());
        }

        if let Some(item) = &summary.next_item {
            state.record(self.name(), format!("next: srs item {}", item.item_id));
            state.response = json!({
                "type": "next_activity",
                "source": "srs",
                "pillar": item.pillar,
                "item_id": item.item_id,
                "label": item.label,
                "reason": item.reason,
            });
            return Ok(());
        }

        // Nothing scheduled: suggest work on the weakest pillar
        let weakest = weakest_pillar(state);
        state.record(self.name(), format!("next: suggestion for {}", weakest.as_str()));
        state.response = json!({
            "type": "next_activity",
            "source": "suggestion",
            "suggestions": [
                {"pillar": weakest, "reason": "weakest_pillar"},
                {"pillar": Pillar::Vocabulary, "reason": "technical_vocabulary"},
                {"pillar": Pillar::Speaking, "reason": "daily_practice"},
            ],
        });
        Ok(())
    }
}

/// Due counts, low-frequency items, and the single most urgent item
pub async fn refresh_summary(ctx: &AgentContext, user_id: &str) -> Result<SrsSummary> {
    let now = Utc::now();

    let vocabulary_due = db::vocabulary::due_count(&ctx.db, user_id, now).await?;
    let grammar_due = db::grammar::due_count(&ctx.db, user_id, now).await?;
    let pronunciation_due = db::pronunciation::due_count(&ctx.db, user_id, now).await?;

    let low_frequency_items: Vec<SrsItem> =
        db::vocabulary::load_low_frequency_words(&ctx.db, user_id, now, MAX_LOW_FREQUENCY_REVIEWS)
            .await?
            .into_iter()
            .map(|p| SrsItem {
                pillar: Pillar::Vocabulary,
                item_id: p.word_id,
                label: p.word,
                reason: "low_frequency".to_string(),
            })
            .collect();

    // Candidates in pillar order; overdue-by-a-week items jump the queue
    let mut due_items: Vec<(ReviewPriority, SrsItem)> = Vec::new();
    for p in db::vocabulary::load_due_words(&ctx.db, user_id, now, 5).await? {
        due_items.push((
            review_priority(p.srs.next_review, now),
            SrsItem {
                pillar: Pillar::Vocabulary,
                item_id: p.word_id,
                label: p.word,
                reason: "srs_due".to_string(),
            },
        ));
    }
    for p in db::grammar::load_due_rules(&ctx.db, user_id, now, 5).await? {
        due_items.push((
            review_priority(p.srs.next_review, now),
            SrsItem {
                pillar: Pillar::Grammar,
                item_id: p.rule_id,
                label: p.rule_name,
                reason: "srs_due".to_string(),
            },
        ));
    }
    for p in db::pronunciation::load_due_sounds(&ctx.db, user_id, now, 5).await? {
        due_items.push((
            review_priority(p.srs.next_review, now),
            SrsItem {
                pillar: Pillar::Pronunciation,
                item_id: p.sound_id,
                label: p.phoneme,
                reason: "srs_due".to_string(),
            },
        ));
    }

    let next_item = due_items
        .iter()
        .find(|(priority, _)| *priority == ReviewPriority::High)
        .or_else(|| due_items.first())
        .map(|(_, item)| item.clone());

    let next_item = match next_item {
        Some(item) => Some(item),
        None => {
            // No SRS dues: struggling sounds, then stale vocabulary
            let needs_practice =
                db::pronunciation::load_needs_practice(&ctx.db, user_id, NEEDS_PRACTICE_ACCURACY, 1)
                    .await?;
            needs_practice
                .into_iter()
                .next()
                .map(|p| SrsItem {
                    pillar: Pillar::Pronunciation,
                    item_id: p.sound_id,
                    label: p.phoneme,
                    reason: "low_accuracy".to_string(),
                })
                .or_else(|| low_frequency_items.first().cloned())
        }
    };

    Ok(SrsSummary {
        vocabulary_due,
        grammar_due,
        pronunciation_due,
        low_frequency_items,
        next_item,
    })
}

/// Lay out today's reviews under the user's daily goal
async fn build_schedule(
    ctx: &AgentContext,
    state: &ConversationState,
    date: &str,
) -> Result<DailySchedule> {
    let now = Utc::now();
    let user_id = &state.user.id;
    let goal = state.user.profile.daily_goal_minutes;
    let mut schedule = DailySchedule::new(user_id, date, goal);
    let mut remaining = goal;

    for p in db::vocabulary::load_due_words(&ctx.db, user_id, now, MAX_VOCABULARY_REVIEWS).await? {
        if remaining < VOCABULARY_MINUTES {
            break;
        }
        push_review(
            &mut schedule,
            "vocabulary_review",
            Pillar::Vocabulary,
            Some(p.word_id),
            "srs_due",
            priority_label(review_priority(p.srs.next_review, now)),
            VOCABULARY_MINUTES,
        );
        remaining -= VOCABULARY_MINUTES;
    }

    for p in db::grammar::load_due_rules(&ctx.db, user_id, now, MAX_GRAMMAR_REVIEWS).await? {
        if remaining < GRAMMAR_MINUTES {
            break;
        }
        push_review(
            &mut schedule,
            "grammar_review",
            Pillar::Grammar,
            Some(p.rule_id),
            "srs_due",
            priority_label(review_priority(p.srs.next_review, now)),
            GRAMMAR_MINUTES,
        );
        remaining -= GRAMMAR_MINUTES;
    }

    let mut pronunciation_slots = MAX_PRONUNCIATION_REVIEWS;
    for p in
        db::pronunciation::load_due_sounds(&ctx.db, user_id, now, MAX_PRONUNCIATION_REVIEWS).await?
    {
        if remaining < PRONUNCIATION_MINUTES || pronunciation_slots == 0 {
            break;
        }
        push_review(
            &mut schedule,
            "pronunciation_review",
            Pillar::Pronunciation,
            Some(p.sound_id),
            "srs_due",
            priority_label(review_priority(p.srs.next_review, now)),
            PRONUNCIATION_MINUTES,
        );
        remaining -= PRONUNCIATION_MINUTES;
        pronunciation_slots -= 1;
    }
    if pronunciation_slots > 0 {
        let scheduled: Vec<String> = schedule
            .scheduled_reviews
            .iter()
            .filter_map(|r| r.item_id.clone())
            .collect();
        for p in db::pronunciation::load_needs_practice(
            &ctx.db,
            user_id,
            NEEDS_PRACTICE_ACCURACY,
            MAX_PRONUNCIATION_REVIEWS,
        )
        .await?
        {
            if remaining < PRONUNCIATION_MINUTES || pronunciation_slots == 0 {
                break;
            }
            if scheduled.contains(&p.sound_id) {
                continue;
            }
            push_review(
                &mut schedule,
                "pronunciation_practice",
                Pillar::Pronunciation,
                Some(p.sound_id),
                "low_accuracy",
                "normal",
                PRONUNCIATION_MINUTES,
            );
            remaining -= PRONUNCIATION_MINUTES;
            pronunciation_slots -= 1;
        }
    }

    let scheduled_words: Vec<String> = schedule
        .scheduled_reviews
        .iter()
        .filter(|r| r.pillar == Pillar::Vocabulary)
        .filter_map(|r| r.item_id.clone())
        .collect();
    for p in
        db::vocabulary::load_low_frequency_words(&ctx.db, user_id, now, MAX_LOW_FREQUENCY_REVIEWS)
            .await?
    {
        if remaining < VOCABULARY_MINUTES {
            break;
        }
        if scheduled_words.contains(&p.word_id) {
            continue;
        }
        push_review(
            &mut schedule,
            "vocabulary_refresh",
            Pillar::Vocabulary,
            Some(p.word_id),
            "low_frequency",
            "low",
            VOCABULARY_MINUTES,
        );
        remaining -= VOCABULARY_MINUTES;
    }

    if remaining >= SPEAKING_MINUTES {
        push_review(
            &mut schedule,
            "speaking_practice",
            Pillar::Speaking,
            None,
            "daily_practice",
            "normal",
            SPEAKING_MINUTES,
        );
    }

    schedule.daily_goal_progress.total_activities = schedule.scheduled_reviews.len() as i64;
    Ok(schedule)
}

fn push_review(
    schedule: &mut DailySchedule,
    review_type: &str,
    pillar: Pillar,
    item_id: Option<String>,
    reason: &str,
    priority: &str,
    minutes: i64,
) {
    let id = format!("review_{}", schedule.scheduled_reviews.len() + 1);
    schedule.scheduled_reviews.push(ScheduledReview {
        id,
        review_type: review_type.to_string(),
        pillar,
        item_id,
        reason: reason.to_string(),
        priority: priority.to_string(),
        estimated_minutes: minutes,
    });
}

fn priority_label(priority: ReviewPriority) -> &'static str {
    match priority {
        ReviewPriority::High => "high",
        ReviewPriority::Normal => "normal",
        ReviewPriority::Low => "low",
    }
}

/// The pillar with the lowest stored score
fn weakest_pillar(state: &ConversationState) -> Pillar {
    [
        Pillar::Vocabulary,
        Pillar::Grammar,
        Pillar::Pronunciation,
        Pillar::Speaking,
    ]
    .into_iter()
    .min_by(|a, b| {
        state
            .user
            .pillar_score(*a)
            .total_cmp(&state.user.pillar_score(*b))
    })
    .unwrap_or(Pillar::Vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_common::models::user::User;
    use serde_json::json;

    #[test]
    fn review_ids_are_sequential_within_a_schedule() {
        let mut schedule = DailySchedule::new("u1", "2026-08-30", 30);
        push_review(&mut schedule, "vocabulary_review", Pillar::Vocabulary, Some("word_think".to_string()), "srs_due", "high", VOCABULARY_MINUTES);
        push_review(&mut schedule, "grammar_review", Pillar::Grammar, Some("rule_articles".to_string()), "srs_due", "normal", GRAMMAR_MINUTES);
        assert_eq!(schedule.scheduled_reviews[0].id, "review_1");
        assert_eq!(schedule.scheduled_reviews[1].id, "review_2");
        assert_eq!(schedule.scheduled_reviews[1].estimated_minutes, GRAMMAR_MINUTES);
    }

    #[test]
    fn weakest_pillar_tracks_the_lowest_score() {
        let mut user = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        user.vocabulary_score = 80.0;
        user.grammar_score = 60.0;
        user.pronunciation_score = 45.0;
        user.speaking_score = 70.0;
        let state = ConversationState::new("get_next_activity", user, json!({}));
        assert_eq!(weakest_pillar(&state), Pillar::Pronunciation);
    }

    #[test]
    fn priority_labels_cover_all_variants() {
        assert_eq!(priority_label(ReviewPriority::High), "high");
        assert_eq!(priority_label(ReviewPriority::Normal), "normal");
        assert_eq!(priority_label(ReviewPriority::Low), "low");
    }
}
