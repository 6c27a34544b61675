//! Database initialization
//!
//! Creates the database file on first run and brings the schema up with
//! idempotent `CREATE TABLE IF NOT EXISTS` statements. Catalog content
//! (words, rules, sounds, topics) is seeded by the service after this
//! returns.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while one request writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_users_table(&pool).await?;
    create_vocabulary_words_table(&pool).await?;
    create_vocabulary_progress_table(&pool).await?;
    create_grammar_rules_table(&pool).await?;
    create_grammar_progress_table(&pool).await?;
    create_phonetic_sounds_table(&pool).await?;
    create_pronunciation_progress_table(&pool).await?;
    create_conversation_topics_table(&pool).await?;
    create_speaking_sessions_table(&pool).await?;
    create_corrective_activities_table(&pool).await?;
    create_daily_schedules_table(&pool).await?;

    Ok(pool)
}

pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            current_level TEXT NOT NULL DEFAULT 'beginner',
            profile TEXT NOT NULL DEFAULT '{}',
            total_study_time_minutes INTEGER NOT NULL DEFAULT 0,
            current_streak_days INTEGER NOT NULL DEFAULT 0,
            longest_streak_days INTEGER NOT NULL DEFAULT 0,
            last_activity_date TEXT,
            initial_assessment_completed INTEGER NOT NULL DEFAULT 0,
            last_assessment_date TEXT,
            sessions_since_last_assessment INTEGER NOT NULL DEFAULT 0,
            vocabulary_score REAL NOT NULL DEFAULT 0,
            grammar_score REAL NOT NULL DEFAULT 0,
            pronunciation_score REAL NOT NULL DEFAULT 0,
            speaking_score REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_vocabulary_words_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vocabulary_words (
            id TEXT PRIMARY KEY,
            word TEXT NOT NULL,
            part_of_speech TEXT NOT NULL,
            definition TEXT NOT NULL,
            example_sentence TEXT NOT NULL,
            ipa_pronunciation TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'common',
            subcategory TEXT,
            difficulty TEXT NOT NULL DEFAULT 'beginner',
            frequency_rank INTEGER NOT NULL,
            portuguese_translation TEXT,
            synonyms TEXT NOT NULL DEFAULT '[]',
            antonyms TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vocabulary_words_rank ON vocabulary_words(difficulty, frequency_rank)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_vocabulary_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vocabulary_progress (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            word_id TEXT NOT NULL,
            word TEXT NOT NULL,
            mastery_level TEXT NOT NULL DEFAULT 'new',
            practice_count INTEGER NOT NULL DEFAULT 0,
            correct_count INTEGER NOT NULL DEFAULT 0,
            last_practiced TEXT,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review TEXT NOT NULL,
            last_review TEXT,
            average_response_time_ms INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, word_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vocabulary_progress_review ON vocabulary_progress(user_id, next_review)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_grammar_rules_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grammar_rules (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            difficulty TEXT NOT NULL DEFAULT 'beginner',
            english_explanation TEXT NOT NULL,
            portuguese_explanation TEXT,
            exists_in_portuguese INTEGER NOT NULL DEFAULT 0,
            portuguese_equivalent TEXT,
            common_mistakes TEXT NOT NULL DEFAULT '[]',
            examples TEXT NOT NULL DEFAULT '[]',
            common_errors TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_grammar_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grammar_progress (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            rule_id TEXT NOT NULL,
            rule_name TEXT NOT NULL,
            practice_count INTEGER NOT NULL DEFAULT 0,
            correct_count INTEGER NOT NULL DEFAULT 0,
            last_practiced TEXT,
            last_score REAL NOT NULL DEFAULT 0,
            best_explanation_score REAL NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review TEXT NOT NULL,
            last_review TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, rule_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_grammar_progress_review ON grammar_progress(user_id, next_review)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_phonetic_sounds_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS phonetic_sounds (
            id TEXT PRIMARY KEY,
            phoneme TEXT NOT NULL,
            name TEXT NOT NULL,
            exists_in_portuguese INTEGER NOT NULL DEFAULT 0,
            difficulty TEXT NOT NULL DEFAULT 'medium',
            mouth_position TEXT NOT NULL DEFAULT '{}',
            example_words TEXT NOT NULL DEFAULT '[]',
            common_mistake TEXT NOT NULL DEFAULT '',
            portuguese_similar TEXT,
            tip TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_pronunciation_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pronunciation_progress (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            sound_id TEXT NOT NULL,
            phoneme TEXT NOT NULL,
            practice_count INTEGER NOT NULL DEFAULT 0,
            last_practiced TEXT,
            average_accuracy REAL NOT NULL DEFAULT 0,
            best_accuracy REAL NOT NULL DEFAULT 0,
            recent_accuracies TEXT NOT NULL DEFAULT '[]',
            practice_history TEXT NOT NULL DEFAULT '[]',
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review TEXT NOT NULL,
            last_review TEXT,
            mastered INTEGER NOT NULL DEFAULT 0,
            needs_mouth_position_review INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, sound_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pronunciation_progress_review ON pronunciation_progress(user_id, next_review)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_conversation_topics_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conversation_topics (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_pt TEXT NOT NULL,
            description TEXT NOT NULL,
            description_pt TEXT NOT NULL,
            difficulty TEXT NOT NULL DEFAULT 'beginner',
            category TEXT NOT NULL DEFAULT 'general',
            sample_questions TEXT NOT NULL DEFAULT '[]',
            vocabulary_hints TEXT NOT NULL DEFAULT '[]',
            opening_prompts TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_speaking_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS speaking_sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            topic_id TEXT NOT NULL,
            topic_name TEXT NOT NULL,
            topic_difficulty TEXT NOT NULL DEFAULT 'beginner',
            started_at TEXT NOT NULL,
            ended_at TEXT,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            exchanges TEXT NOT NULL DEFAULT '[]',
            current_turn INTEGER NOT NULL DEFAULT 0,
            grammar_errors TEXT NOT NULL DEFAULT '[]',
            pronunciation_errors TEXT NOT NULL DEFAULT '[]',
            generated_activity_ids TEXT NOT NULL DEFAULT '[]',
            summary TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_speaking_sessions_user ON speaking_sessions(user_id, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_corrective_activities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS corrective_activities (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            source_session_id TEXT,
            source_turn_number INTEGER NOT NULL DEFAULT 0,
            pillar TEXT NOT NULL,
            activity_type TEXT NOT NULL,
            detail TEXT NOT NULL,
            occurrence_count INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'pending',
            priority INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_corrective_activities_pending ON corrective_activities(user_id, status, priority)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_daily_schedules_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_schedules (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            scheduled_reviews TEXT NOT NULL DEFAULT '[]',
            completed_reviews TEXT NOT NULL DEFAULT '[]',
            daily_goal_progress TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
