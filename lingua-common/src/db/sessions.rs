//! Speaking session and conversation topic persistence

use super::{parse_opt_timestamp, parse_timestamp};
use crate::models::speaking::{ConversationTopic, SpeakingSession};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

// ==================== topics ====================

/// Insert or update a conversation topic (seeding path)
pub async fn save_topic(pool: &SqlitePool, topic: &ConversationTopic) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO conversation_topics (
            id, name, name_pt, description, description_pt, difficulty,
            category, sample_questions, vocabulary_hints, opening_prompts
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            sample_questions = excluded.sample_questions,
            opening_prompts = excluded.opening_prompts
        "#,
    )
    .bind(&topic.id)
    .bind(&topic.name)
    .bind(&topic.name_pt)
    .bind(&topic.description)
    .bind(&topic.description_pt)
    .bind(topic.difficulty.as_str())
    .bind(&topic.category)
    .bind(serde_json::to_string(&topic.sample_questions)?)
    .bind(serde_json::to_string(&topic.vocabulary_hints)?)
    .bind(serde_json::to_string(&topic.opening_prompts)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one topic by id
pub async fn load_topic(pool: &SqlitePool, id: &str) -> Result<Option<ConversationTopic>> {
    let row = sqlx::query("SELECT * FROM conversation_topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_topic(&r)).transpose()
}

/// All topics, optionally filtered by difficulty
pub async fn list_topics(
    pool: &SqlitePool,
    difficulty: Option<&str>,
) -> Result<Vec<ConversationTopic>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM conversation_topics
        WHERE (?1 IS NULL OR difficulty = ?1)
        ORDER BY id
        "#,
    )
    .bind(difficulty)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_topic).collect()
}

/// Count topics (seeding check)
pub async fn count_topics(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversation_topics")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn row_to_topic(row: &SqliteRow) -> Result<ConversationTopic> {
    let difficulty: String = row.get("difficulty");
    let sample_questions: String = row.get("sample_questions");
    let vocabulary_hints: String = row.get("vocabulary_hints");
    let opening_prompts: String = row.get("opening_prompts");

    Ok(ConversationTopic {
        id: row.get("id"),
        name: row.get("name"),
        name_pt: row.get("name_pt"),
        description: row.get("description"),
        description_pt: row.get("description_pt"),
        difficulty: difficulty.parse()?,
        category: row.get("category"),
        sample_questions: serde_json::from_str(&sample_questions)?,
        vocabulary_hints: serde_json::from_str(&vocabulary_hints)?,
        opening_prompts: serde_json::from_str(&opening_prompts)?,
    })
}

// ==================== sessions ====================

/// Insert or update a speaking session
pub async fn save_session(pool: &SqlitePool, session: &SpeakingSession) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO speaking_sessions (
            id, user_id, status, topic_id, topic_name, topic_difficulty,
            started_at, ended_at, duration_seconds, exchanges, current_turn,
            grammar_errors, pronunciation_errors, generated_activity_ids,
            summary, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            ended_at = excluded.ended_at,
            duration_seconds = excluded.duration_seconds,
            exchanges = excluded.exchanges,
            current_turn = excluded.current_turn,
            grammar_errors = excluded.grammar_errors,
            pronunciation_errors = excluded.pronunciation_errors,
            generated_activity_ids = excluded.generated_activity_ids,
            summary = excluded.summary,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(session.status.as_str())
    .bind(&session.topic_id)
    .bind(&session.topic_name)
    .bind(session.topic_difficulty.as_str())
    .bind(session.started_at.to_rfc3339())
    .bind(session.ended_at.map(|t| t.to_rfc3339()))
    .bind(session.duration_seconds)
    .bind(serde_json::to_string(&session.exchanges)?)
    .bind(session.current_turn)
    .bind(serde_json::to_string(&session.grammar_errors)?)
    .bind(serde_json::to_string(&session.pronunciation_errors)?)
    .bind(serde_json::to_string(&session.generated_activity_ids)?)
    .bind(
        session
            .summary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?,
    )
    .bind(session.created_at.to_rfc3339())
    .bind(session.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one session by id
pub async fn load_session(
    pool: &SqlitePool,
    user_id: &str,
    session_id: &str,
) -> Result<Option<SpeakingSession>> {
    let row = sqlx::query("SELECT * FROM speaking_sessions WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_session(&r)).transpose()
}

/// The user's most recent active session, if any
pub async fn load_active_session(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<SpeakingSession>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM speaking_sessions
        WHERE user_id = ? AND status = 'active'
        ORDER BY started_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_session(&r)).transpose()
}

/// Sessions started after a threshold (assessment looks at the last 30 days)
pub async fn count_sessions_since(
    pool: &SqlitePool,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM speaking_sessions WHERE user_id = ? AND started_at > ?",
    )
    .bind(user_id)
    .bind(since.to_rfc3339())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// (total sessions, completed sessions) for a user
pub async fn session_counts(pool: &SqlitePool, user_id: &str) -> Result<(i64, i64)> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed
        FROM speaking_sessions
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok((row.get("total"), row.get("completed")))
}

/// Most recent sessions, newest first
pub async fn load_recent_sessions(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<SpeakingSession>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM speaking_sessions
        WHERE user_id = ?
        ORDER BY started_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_session).collect()
}

fn row_to_session(row: &SqliteRow) -> Result<SpeakingSession> {
    let status: String = row.get("status");
    let difficulty: String = row.get("topic_difficulty");
    let started_at: String = row.get("started_at");
    let exchanges: String = row.get("exchanges");
    let grammar_errors: String = row.get("grammar_errors");
    let pronunciation_errors: String = row.get("pronunciation_errors");
    let activity_ids: String = row.get("generated_activity_ids");
    let summary: Option<String> = row.get("summary");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(SpeakingSession {
        id: row.get("id"),
        user_id: row.get("user_id"),
        status: status.parse()?,
        topic_id: row.get("topic_id"),
        topic_name: row.get("topic_name"),
        topic_difficulty: difficulty.parse()?,
        started_at: parse_timestamp(&started_at)?,
        ended_at: parse_opt_timestamp(row.get("ended_at"))?,
        duration_seconds: row.get("duration_seconds"),
        exchanges: serde_json::from_str(&exchanges)?,
        current_turn: row.get("current_turn"),
        grammar_errors: serde_json::from_str(&grammar_errors)?,
        pronunciation_errors: serde_json::from_str(&pronunciation_errors)?,
        generated_activity_ids: serde_json::from_str(&activity_ids)?,
        summary: summary.map(|s| serde_json::from_str(&s)).transpose()?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_speaking_sessions_table;
    use crate::models::speaking::{ConversationTopic, SessionStatus};
    use crate::models::Difficulty;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init::create_conversation_topics_table(&pool)
            .await
            .unwrap();
        create_speaking_sessions_table(&pool).await.unwrap();
        pool
    }

    fn topic() -> ConversationTopic {
        ConversationTopic {
            id: "daily_routine".to_string(),
            name: "Daily Routine".to_string(),
            name_pt: "Rotina Diária".to_string(),
            description: "Talk about your typical day".to_string(),
            description_pt: "Fale sobre o seu dia típico".to_string(),
            difficulty: Difficulty::Beginner,
            category: "general".to_string(),
            sample_questions: vec!["What time do you wake up?".to_string()],
            vocabulary_hints: vec!["wake up".to_string(), "commute".to_string()],
            opening_prompts: vec!["Tell me about your mornings.".to_string()],
        }
    }

    #[tokio::test]
    async fn exchanges_round_trip() {
        let pool = test_pool().await;
        let mut session = SpeakingSession::new("u1", &topic());
        session.push_exchange("agent", "Tell me about your mornings.".to_string(), true);
        session.push_exchange("user", "I wake up at seven.".to_string(), false);

        save_session(&pool, &session).await.unwrap();

        let loaded = load_session(&pool, "u1", &session.id).await.unwrap().unwrap();
        assert_eq!(loaded.exchanges.len(), 2);
        assert_eq!(loaded.exchanges[1].speaker, "user");
        assert_eq!(loaded.current_turn, 2);
    }

    #[tokio::test]
    async fn active_session_lookup_ignores_completed() {
        let pool = test_pool().await;
        let mut done = SpeakingSession::new("u1", &topic());
        done.status = SessionStatus::Completed;
        done.ended_at = Some(Utc::now());
        save_session(&pool, &done).await.unwrap();

        assert!(load_active_session(&pool, "u1").await.unwrap().is_none());

        let active = SpeakingSession::new("u1", &topic());
        save_session(&pool, &active).await.unwrap();

        let found = load_active_session(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(found.id, active.id);

        let (total, completed) = session_counts(&pool, "u1").await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(completed, 1);
    }

    #[tokio::test]
    async fn topics_filter_by_difficulty() {
        let pool = test_pool().await;
        save_topic(&pool, &topic()).await.unwrap();

        let mut harder = topic();
        harder.id = "job_interview".to_string();
        harder.difficulty = Difficulty::Intermediate;
        save_topic(&pool, &harder).await.unwrap();

        let beginner = list_topics(&pool, Some("beginner")).await.unwrap();
        assert_eq!(beginner.len(), 1);
        assert_eq!(beginner[0].id, "daily_routine");
        assert_eq!(count_topics(&pool).await.unwrap(), 2);
    }
}
