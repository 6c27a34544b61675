//! Corrective activity persistence

use super::parse_timestamp;
use crate::models::activity::{ActivityDetail, ActivityStatus, CorrectiveActivity};
use crate::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Insert or update a corrective activity
pub async fn save_activity(pool: &SqlitePool, activity: &CorrectiveActivity) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO corrective_activities (
            id, user_id, source_session_id, source_turn_number, pillar,
            activity_type, detail, occurrence_count, status, priority,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            occurrence_count = excluded.occurrence_count,
            priority = excluded.priority,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&activity.id)
    .bind(&activity.user_id)
    .bind(&activity.source_session_id)
    .bind(activity.source_turn_number)
    .bind(activity.detail.pillar())
    .bind(&activity.activity_type)
    .bind(serde_json::to_string(&activity.detail)?)
    .bind(activity.occurrence_count)
    .bind(activity.status.as_str())
    .bind(activity.priority)
    .bind(activity.created_at.to_rfc3339())
    .bind(activity.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Pending activities, highest priority first, oldest breaking ties
pub async fn load_pending(
    pool: &SqlitePool,
    user_id: &str,
    pillar: Option<&str>,
    limit: i64,
) -> Result<Vec<CorrectiveActivity>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM corrective_activities
        WHERE user_id = ?1 AND status = 'pending'
          AND (?2 IS NULL OR pillar = ?2)
        ORDER BY priority DESC, created_at
        LIMIT ?3
        "#,
    )
    .bind(user_id)
    .bind(pillar)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_activity).collect()
}

/// Load one activity by id
pub async fn load_activity(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> Result<Option<CorrectiveActivity>> {
    let row = sqlx::query("SELECT * FROM corrective_activities WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(activity_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_activity(&r)).transpose()
}

/// Move an activity to a new status
pub async fn update_status(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
    status: ActivityStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE corrective_activities
        SET status = ?, updated_at = ?
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(user_id)
    .bind(activity_id)
    .execute(pool)
    .await?;

    Ok(())
}

fn row_to_activity(row: &SqliteRow) -> Result<CorrectiveActivity> {
    let detail_json: String = row.get("detail");
    let detail: ActivityDetail = serde_json::from_str(&detail_json)?;
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(CorrectiveActivity {
        id: row.get("id"),
        user_id: row.get("user_id"),
        source_session_id: row.get("source_session_id"),
        source_turn_number: row.get("source_turn_number"),
        activity_type: row.get("activity_type"),
        detail,
        occurrence_count: row.get("occurrence_count"),
        status: status.parse()?,
        priority: row.get("priority"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_corrective_activities_table;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_corrective_activities_table(&pool).await.unwrap();
        pool
    }

    fn grammar_activity(id: &str, occurrences: i64) -> CorrectiveActivity {
        CorrectiveActivity::new(
            id.to_string(),
            "u1",
            Some("session_1".to_string()),
            2,
            ActivityDetail::Grammar {
                rule: "articles".to_string(),
                incorrect_example: "I am engineer".to_string(),
                correct_example: "I am an engineer".to_string(),
                explanation: "Professions take an article".to_string(),
            },
            occurrences,
        )
    }

    #[tokio::test]
    async fn pending_sorted_by_priority() {
        let pool = test_pool().await;
        save_activity(&pool, &grammar_activity("a_low", 1)).await.unwrap();
        save_activity(&pool, &grammar_activity("a_high", 4)).await.unwrap();

        let pending = load_pending(&pool, "u1", None, 10).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "a_high");
    }

    #[tokio::test]
    async fn completed_activities_leave_the_pending_list() {
        let pool = test_pool().await;
        save_activity(&pool, &grammar_activity("a1", 1)).await.unwrap();

        update_status(&pool, "u1", "a1", ActivityStatus::Completed)
            .await
            .unwrap();

        let pending = load_pending(&pool, "u1", None, 10).await.unwrap();
        assert!(pending.is_empty());

        let loaded = load_activity(&pool, "u1", "a1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ActivityStatus::Completed);
    }

    #[tokio::test]
    async fn detail_round_trips_through_json_column() {
        let pool = test_pool().await;
        save_activity(&pool, &grammar_activity("a1", 2)).await.unwrap();

        let loaded = load_activity(&pool, "u1", "a1").await.unwrap().unwrap();
        match loaded.detail {
            ActivityDetail::Grammar { ref rule, .. } => assert_eq!(rule, "articles"),
            _ => panic!("expected grammar detail"),
        }
    }
}
