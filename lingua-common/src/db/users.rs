//! User persistence

use super::{parse_opt_timestamp, parse_timestamp};
use crate::models::user::{User, UserProfile};
use crate::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Insert or update a user record
pub async fn save_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (
            id, email, name, password_hash, current_level, profile,
            total_study_time_minutes, current_streak_days, longest_streak_days,
            last_activity_date, initial_assessment_completed, last_assessment_date,
            sessions_since_last_assessment, vocabulary_score, grammar_score,
            pronunciation_score, speaking_score, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            email = excluded.email,
            name = excluded.name,
            password_hash = excluded.password_hash,
            current_level = excluded.current_level,
            profile = excluded.profile,
            total_study_time_minutes = excluded.total_study_time_minutes,
            current_streak_days = excluded.current_streak_days,
            longest_streak_days = excluded.longest_streak_days,
            last_activity_date = excluded.last_activity_date,
            initial_assessment_completed = excluded.initial_assessment_completed,
            last_assessment_date = excluded.last_assessment_date,
            sessions_since_last_assessment = excluded.sessions_since_last_assessment,
            vocabulary_score = excluded.vocabulary_score,
            grammar_score = excluded.grammar_score,
            pronunciation_score = excluded.pronunciation_score,
            speaking_score = excluded.speaking_score,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.current_level.as_str())
    .bind(serde_json::to_string(&user.profile)?)
    .bind(user.total_study_time_minutes)
    .bind(user.current_streak_days)
    .bind(user.longest_streak_days)
    .bind(user.last_activity_date.map(|t| t.to_rfc3339()))
    .bind(user.initial_assessment_completed)
    .bind(user.last_assessment_date.map(|t| t.to_rfc3339()))
    .bind(user.sessions_since_last_assessment)
    .bind(user.vocabulary_score)
    .bind(user.grammar_score)
    .bind(user.pronunciation_score)
    .bind(user.speaking_score)
    .bind(user.created_at.to_rfc3339())
    .bind(user.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a user by id
pub async fn load_user_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_user(&r)).transpose()
}

/// Load a user by email (login path)
pub async fn load_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_user(&r)).transpose()
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    let level: String = row.get("current_level");
    let profile_json: String = row.get("profile");
    let profile: UserProfile = serde_json::from_str(&profile_json)?;

    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        current_level: level.parse()?,
        profile,
        total_study_time_minutes: row.get("total_study_time_minutes"),
        current_streak_days: row.get("current_streak_days"),
        longest_streak_days: row.get("longest_streak_days"),
        last_activity_date: parse_opt_timestamp(row.get("last_activity_date"))?,
        initial_assessment_completed: row.get("initial_assessment_completed"),
        last_assessment_date: parse_opt_timestamp(row.get("last_assessment_date"))?,
        sessions_since_last_assessment: row.get("sessions_since_last_assessment"),
        vocabulary_score: row.get("vocabulary_score"),
        grammar_score: row.get("grammar_score"),
        pronunciation_score: row.get("pronunciation_score"),
        speaking_score: row.get("speaking_score"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_users_table;
    use crate::models::user::EnglishLevel;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_users_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let pool = test_pool().await;
        let user = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );

        save_user(&pool, &user).await.unwrap();

        let loaded = load_user_by_email(&pool, "ana@example.com")
            .await
            .unwrap()
            .expect("user not found");
        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.current_level, EnglishLevel::Beginner);
        assert_eq!(loaded.profile.native_language, "pt-BR");
    }

    #[tokio::test]
    async fn upsert_keeps_id_and_updates_fields() {
        let pool = test_pool().await;
        let mut user = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        save_user(&pool, &user).await.unwrap();

        user.current_level = EnglishLevel::Intermediate;
        user.vocabulary_score = 72.5;
        save_user(&pool, &user).await.unwrap();

        let loaded = load_user_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_level, EnglishLevel::Intermediate);
        assert_eq!(loaded.vocabulary_score, 72.5);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let pool = test_pool().await;
        let first = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        let second = User::new(
            "ana@example.com".to_string(),
            "Other Ana".to_string(),
            "hash2".to_string(),
        );

        save_user(&pool, &first).await.unwrap();
        assert!(save_user(&pool, &second).await.is_err());
    }
}
