//! Daily schedules and per-pillar progress summaries

use super::Pillar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item placed on the daily schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledReview {
    /// `review_{n}` within the schedule
    pub id: String,
    pub review_type: String,
    pub pillar: Pillar,
    pub item_id: Option<String>,
    /// Why it was scheduled: srs_due, low_accuracy, low_frequency, daily_practice
    pub reason: String,
    pub priority: String,
    pub estimated_minutes: i64,
}

/// Progress toward the daily study goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyGoalProgress {
    pub minutes_studied: i64,
    pub activities_completed: i64,
    pub goal_minutes: i64,
    pub total_activities: i64,
}

/// One day's study plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySchedule {
    /// `schedule_{user_id}_{YYYY-MM-DD}`
    pub id: String,
    pub user_id: String,
    /// YYYY-MM-DD
    pub date: String,
    pub scheduled_reviews: Vec<ScheduledReview>,
    pub completed_reviews: Vec<ScheduledReview>,
    pub daily_goal_progress: DailyGoalProgress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySchedule {
    pub fn new(user_id: &str, date: &str, goal_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            id: format!("schedule_{}_{}", user_id, date),
            user_id: user_id.to_string(),
            date: date.to_string(),
            scheduled_reviews: Vec::new(),
            completed_reviews: Vec::new(),
            daily_goal_progress: DailyGoalProgress {
                minutes_studied: 0,
                activities_completed: 0,
                goal_minutes,
                total_activities: 0,
            },
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregated statistics for one pillar, fed into assessments and dashboards
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PillarStats {
    pub total_items: i64,
    pub mastered_items: i64,
    pub items_due: i64,
    /// 0..=100; score for grammar, accuracy for pronunciation
    pub average_score: f64,
    pub last_activity: Option<DateTime<Utc>>,
}
