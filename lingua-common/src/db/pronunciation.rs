//! Phonetic sound catalog and pronunciation progress persistence

use super::{parse_opt_timestamp, parse_timestamp};
use crate::models::pronunciation::{PhoneticSound, PronunciationProgress};
use crate::srs::SrsRecord;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

// ==================== catalog ====================

/// Insert or update a catalog sound (seeding path)
pub async fn save_sound(pool: &SqlitePool, sound: &PhoneticSound) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO phonetic_sounds (
            id, phoneme, name, exists_in_portuguese, difficulty,
            mouth_position, example_words, common_mistake,
            portuguese_similar, tip
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            example_words = excluded.example_words,
            tip = excluded.tip
        "#,
    )
    .bind(&sound.id)
    .bind(&sound.phoneme)
    .bind(&sound.name)
    .bind(sound.exists_in_portuguese)
    .bind(sound.difficulty.as_str())
    .bind(serde_json::to_string(&sound.mouth_position)?)
    .bind(serde_json::to_string(&sound.example_words)?)
    .bind(&sound.common_mistake)
    .bind(&sound.portuguese_similar)
    .bind(&sound.tip)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a catalog sound by id
pub async fn load_sound(pool: &SqlitePool, id: &str) -> Result<Option<PhoneticSound>> {
    let row = sqlx::query("SELECT * FROM phonetic_sounds WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_sound(&r)).transpose()
}

/// Load a catalog sound by IPA phoneme (guidance endpoint)
pub async fn load_sound_by_phoneme(
    pool: &SqlitePool,
    phoneme: &str,
) -> Result<Option<PhoneticSound>> {
    let row = sqlx::query("SELECT * FROM phonetic_sounds WHERE phoneme = ? LIMIT 1")
        .bind(phoneme)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_sound(&r)).transpose()
}

/// All catalog sounds
pub async fn list_sounds(pool: &SqlitePool) -> Result<Vec<PhoneticSound>> {
    let rows = sqlx::query("SELECT * FROM phonetic_sounds ORDER BY id")
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_sound).collect()
}

/// Count catalog sounds (seeding check)
pub async fn count_sounds(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phonetic_sounds")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Sounds the user has never practiced
pub async fn load_unpracticed_sounds(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<PhoneticSound>> {
    let rows = sqlx::query(
        r#"
        SELECT s.* FROM phonetic_sounds s
        WHERE s.id NOT IN (SELECT sound_id FROM pronunciation_progress WHERE user_id = ?)
        ORDER BY s.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_sound).collect()
}

fn row_to_sound(row: &SqliteRow) -> Result<PhoneticSound> {
    let difficulty: String = row.get("difficulty");
    let mouth_position: String = row.get("mouth_position");
    let example_words: String = row.get("example_words");

    Ok(PhoneticSound {
        id: row.get("id"),
        phoneme: row.get("phoneme"),
        name: row.get("name"),
        exists_in_portuguese: row.get("exists_in_portuguese"),
        difficulty: difficulty.parse()?,
        mouth_position: serde_json::from_str(&mouth_position)?,
        example_words: serde_json::from_str(&example_words)?,
        common_mistake: row.get("common_mistake"),
        portuguese_similar: row.get("portuguese_similar"),
        tip: row.get("tip"),
    })
}

// ==================== progress ====================

/// Insert or update per-user sound progress
pub async fn save_progress(pool: &SqlitePool, progress: &PronunciationProgress) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pronunciation_progress (
            id, user_id, sound_id, phoneme, practice_count, last_practiced,
            average_accuracy, best_accuracy, recent_accuracies, practice_history,
            ease_factor, interval_days, repetitions, next_review, last_review,
            mastered, needs_mouth_position_review, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, sound_id) DO UPDATE SET
            practice_count = excluded.practice_count,
            last_practiced = excluded.last_practiced,
            average_accuracy = excluded.average_accuracy,
            best_accuracy = excluded.best_accuracy,
            recent_accuracies = excluded.recent_accuracies,
            practice_history = excluded.practice_history,
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions = excluded.repetitions,
            next_review = excluded.next_review,
            last_review = excluded.last_review,
            mastered = excluded.mastered,
            needs_mouth_position_review = excluded.needs_mouth_position_review,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&progress.id)
    .bind(&progress.user_id)
    .bind(&progress.sound_id)
    .bind(&progress.phoneme)
    .bind(progress.practice_count)
    .bind(progress.last_practiced.map(|t| t.to_rfc3339()))
    .bind(progress.average_accuracy)
    .bind(progress.best_accuracy)
    .bind(serde_json::to_string(&progress.recent_accuracies)?)
    .bind(serde_json::to_string(&progress.practice_history)?)
    .bind(progress.srs.ease_factor)
    .bind(progress.srs.interval_days)
    .bind(progress.srs.repetitions)
    .bind(progress.srs.next_review.to_rfc3339())
    .bind(progress.srs.last_review.map(|t| t.to_rfc3339()))
    .bind(progress.mastered)
    .bind(progress.needs_mouth_position_review)
    .bind(progress.created_at.to_rfc3339())
    .bind(progress.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one user/sound progress record
pub async fn load_progress(
    pool: &SqlitePool,
    user_id: &str,
    sound_id: &str,
) -> Result<Option<PronunciationProgress>> {
    let row = sqlx::query("SELECT * FROM pronunciation_progress WHERE user_id = ? AND sound_id = ?")
        .bind(user_id)
        .bind(sound_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_progress(&r)).transpose()
}

/// All sound progress for a user
pub async fn load_all_progress(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<PronunciationProgress>> {
    let rows = sqlx::query("SELECT * FROM pronunciation_progress WHERE user_id = ? ORDER BY updated_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_progress).collect()
}

/// Sounds due for SRS review, most overdue first
pub async fn load_due_sounds(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<PronunciationProgress>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM pronunciation_progress
        WHERE user_id = ? AND next_review <= ?
        ORDER BY next_review
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(now.to_rfc3339())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_progress).collect()
}

/// Practiced sounds under the accuracy threshold, worst first
pub async fn load_needs_practice(
    pool: &SqlitePool,
    user_id: &str,
    accuracy_threshold: f64,
    limit: i64,
) -> Result<Vec<PronunciationProgress>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM pronunciation_progress
        WHERE user_id = ? AND practice_count > 0 AND average_accuracy < ?
        ORDER BY average_accuracy
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(accuracy_threshold)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_progress).collect()
}

/// (sounds practiced, sounds mastered, mean average accuracy) for a user
pub async fn accuracy_summary(pool: &SqlitePool, user_id: &str) -> Result<(i64, i64, f64)> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(CASE WHEN mastered THEN 1 ELSE 0 END), 0) AS mastered,
               COALESCE(AVG(average_accuracy), 0.0) AS average
        FROM pronunciation_progress
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok((row.get("total"), row.get("mastered"), row.get("average")))
}

/// Count of sounds due for review right now
pub async fn due_count(pool: &SqlitePool, user_id: &str, now: DateTime<Utc>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pronunciation_progress WHERE user_id = ? AND next_review <= ?",
    )
    .bind(user_id)
    .bind(now.to_rfc3339())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

fn row_to_progress(row: &SqliteRow) -> Result<PronunciationProgress> {
    let recent: String = row.get("recent_accuracies");
    let history: String = row.get("practice_history");
    let next_review: String = row.get("next_review");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(PronunciationProgress {
        id: row.get("id"),
        user_id: row.get("user_id"),
        sound_id: row.get("sound_id"),
        phoneme: row.get("phoneme"),
        practice_count: row.get("practice_count"),
        last_practiced: parse_opt_timestamp(row.get("last_practiced"))?,
        average_accuracy: row.get("average_accuracy"),
        best_accuracy: row.get("best_accuracy"),
        recent_accuracies: serde_json::from_str(&recent)?,
        practice_history: serde_json::from_str(&history)?,
        srs: SrsRecord {
            ease_factor: row.get("ease_factor"),
            interval_days: row.get("interval_days"),
            repetitions: row.get("repetitions"),
            next_review: parse_timestamp(&next_review)?,
            last_review: parse_opt_timestamp(row.get("last_review"))?,
        },
        mastered: row.get("mastered"),
        needs_mouth_position_review: row.get("needs_mouth_position_review"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::{create_phonetic_sounds_table, create_pronunciation_progress_table};
    use crate::models::pronunciation::{MouthPosition, SoundDifficulty};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_phonetic_sounds_table(&pool).await.unwrap();
        create_pronunciation_progress_table(&pool).await.unwrap();
        pool
    }

    fn sound(id: &str, phoneme: &str) -> PhoneticSound {
        PhoneticSound {
            id: id.to_string(),
            phoneme: phoneme.to_string(),
            name: "test sound".to_string(),
            exists_in_portuguese: false,
            difficulty: SoundDifficulty::High,
            mouth_position: MouthPosition {
                tongue: "between teeth".to_string(),
                lips: "relaxed".to_string(),
                teeth: None,
                airflow: None,
                voicing: None,
            },
            example_words: vec!["think".to_string(), "three".to_string()],
            common_mistake: "replacing with /t/ or /f/".to_string(),
            portuguese_similar: None,
            tip: "let air pass over the tongue".to_string(),
        }
    }

    #[tokio::test]
    async fn sound_round_trip_keeps_nested_fields() {
        let pool = test_pool().await;
        save_sound(&pool, &sound("th_voiceless", "θ")).await.unwrap();

        let loaded = load_sound_by_phoneme(&pool, "θ").await.unwrap().unwrap();
        assert_eq!(loaded.id, "th_voiceless");
        assert_eq!(loaded.example_words, vec!["think", "three"]);
        assert_eq!(loaded.mouth_position.tongue, "between teeth");
    }

    #[tokio::test]
    async fn needs_practice_returns_worst_first() {
        let pool = test_pool().await;

        let mut bad = PronunciationProgress::new("u1", "th_voiceless", "θ");
        bad.practice_count = 4;
        bad.average_accuracy = 55.0;
        save_progress(&pool, &bad).await.unwrap();

        let mut ok = PronunciationProgress::new("u1", "short_i", "ɪ");
        ok.practice_count = 4;
        ok.average_accuracy = 75.0;
        save_progress(&pool, &ok).await.unwrap();

        let mut good = PronunciationProgress::new("u1", "ng_sound", "ŋ");
        good.practice_count = 4;
        good.average_accuracy = 92.0;
        save_progress(&pool, &good).await.unwrap();

        let needy = load_needs_practice(&pool, "u1", 80.0, 10).await.unwrap();
        assert_eq!(needy.len(), 2);
        assert_eq!(needy[0].sound_id, "th_voiceless");
        assert_eq!(needy[1].sound_id, "short_i");
    }

    #[tokio::test]
    async fn accuracy_summary_counts_mastered() {
        let pool = test_pool().await;

        let mut mastered = PronunciationProgress::new("u1", "s1", "θ");
        mastered.practice_count = 5;
        mastered.average_accuracy = 90.0;
        mastered.mastered = true;
        save_progress(&pool, &mastered).await.unwrap();

        let mut learning = PronunciationProgress::new("u1", "s2", "ð");
        learning.practice_count = 2;
        learning.average_accuracy = 70.0;
        save_progress(&pool, &learning).await.unwrap();

        let (total, mastered_count, average) = accuracy_summary(&pool, "u1").await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(mastered_count, 1);
        assert!((average - 80.0).abs() < 1e-9);
    }
}
