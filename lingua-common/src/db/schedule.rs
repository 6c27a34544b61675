//! Daily schedule persistence

use super::parse_timestamp;
use crate::models::progress::DailySchedule;
use crate::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Insert or update the schedule for one user/date
pub async fn save_schedule(pool: &SqlitePool, schedule: &DailySchedule) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO daily_schedules (
            id, user_id, date, scheduled_reviews, completed_reviews,
            daily_goal_progress, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, date) DO UPDATE SET
            scheduled_reviews = excluded.scheduled_reviews,
            completed_reviews = excluded.completed_reviews,
            daily_goal_progress = excluded.daily_goal_progress,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&schedule.id)
    .bind(&schedule.user_id)
    .bind(&schedule.date)
    .bind(serde_json::to_string(&schedule.scheduled_reviews)?)
    .bind(serde_json::to_string(&schedule.completed_reviews)?)
    .bind(serde_json::to_string(&schedule.daily_goal_progress)?)
    .bind(schedule.created_at.to_rfc3339())
    .bind(schedule.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the schedule for one user/date (YYYY-MM-DD)
pub async fn load_schedule(
    pool: &SqlitePool,
    user_id: &str,
    date: &str,
) -> Result<Option<DailySchedule>> {
    let row = sqlx::query("SELECT * FROM daily_schedules WHERE user_id = ? AND date = ?")
        .bind(user_id)
        .bind(date)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_schedule(&r)).transpose()
}

fn row_to_schedule(row: &SqliteRow) -> Result<DailySchedule> {
    let scheduled: String = row.get("scheduled_reviews");
    let completed: String = row.get("completed_reviews");
    let goal: String = row.get("daily_goal_progress");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(DailySchedule {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        scheduled_reviews: serde_json::from_str(&scheduled)?,
        completed_reviews: serde_json::from_str(&completed)?,
        daily_goal_progress: serde_json::from_str(&goal)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_daily_schedules_table;
    use crate::models::progress::ScheduledReview;
    use crate::models::Pillar;

    #[tokio::test]
    async fn schedule_upserts_per_user_and_date() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_daily_schedules_table(&pool).await.unwrap();

        let mut schedule = DailySchedule::new("u1", "2026-08-23", 30);
        schedule.scheduled_reviews.push(ScheduledReview {
            id: "review_0".to_string(),
            review_type: "vocabulary_review".to_string(),
            pillar: Pillar::Vocabulary,
            item_id: Some("w1".to_string()),
            reason: "srs_due".to_string(),
            priority: "high".to_string(),
            estimated_minutes: 2,
        });
        schedule.daily_goal_progress.total_activities = 1;
        save_schedule(&pool, &schedule).await.unwrap();

        // regenerating the same day replaces the review list
        schedule.scheduled_reviews.clear();
        schedule.daily_goal_progress.total_activities = 0;
        save_schedule(&pool, &schedule).await.unwrap();

        let loaded = load_schedule(&pool, "u1", "2026-08-23").await.unwrap().unwrap();
        assert!(loaded.scheduled_reviews.is_empty());
        assert_eq!(loaded.daily_goal_progress.goal_minutes, 30);
        assert!(load_schedule(&pool, "u1", "2026-08-24").await.unwrap().is_none());
    }
}
