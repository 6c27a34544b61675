//! Vocabulary catalog and progress persistence

use super::{parse_opt_timestamp, parse_timestamp};
use crate::models::vocabulary::{VocabularyProgress, VocabularyWord};
use crate::srs::SrsRecord;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

// ==================== catalog ====================

/// Insert or update a catalog word (seeding path)
pub async fn save_word(pool: &SqlitePool, word: &VocabularyWord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vocabulary_words (
            id, word, part_of_speech, definition, example_sentence,
            ipa_pronunciation, category, subcategory, difficulty,
            frequency_rank, portuguese_translation, synonyms, antonyms
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            word = excluded.word,
            definition = excluded.definition,
            example_sentence = excluded.example_sentence,
            frequency_rank = excluded.frequency_rank
        "#,
    )
    .bind(&word.id)
    .bind(&word.word)
    .bind(&word.part_of_speech)
    .bind(&word.definition)
    .bind(&word.example_sentence)
    .bind(&word.ipa_pronunciation)
    .bind(word.category.as_str())
    .bind(&word.subcategory)
    .bind(word.difficulty.as_str())
    .bind(word.frequency_rank)
    .bind(&word.portuguese_translation)
    .bind(serde_json::to_string(&word.synonyms)?)
    .bind(serde_json::to_string(&word.antonyms)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a catalog word by id
pub async fn load_word(pool: &SqlitePool, id: &str) -> Result<Option<VocabularyWord>> {
    let row = sqlx::query("SELECT * FROM vocabulary_words WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_word(&r)).transpose()
}

/// List catalog words with optional category/difficulty filters
pub async fn list_words(
    pool: &SqlitePool,
    category: Option<&str>,
    difficulty: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<VocabularyWord>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM vocabulary_words
        WHERE (?1 IS NULL OR category = ?1)
          AND (?2 IS NULL OR difficulty = ?2)
        ORDER BY frequency_rank
        LIMIT ?3 OFFSET ?4
        "#,
    )
    .bind(category)
    .bind(difficulty)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_word).collect()
}

/// Count catalog words (seeding check)
pub async fn count_words(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vocabulary_words")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Words the user has never practiced, for the given difficulty, most
/// frequent first. `difficulty = None` relaxes the filter (fallback path).
pub async fn load_unpracticed_words(
    pool: &SqlitePool,
    user_id: &str,
    difficulty: Option<&str>,
    limit: i64,
) -> Result<Vec<VocabularyWord>> {
    let rows = sqlx::query(
        r#"
        SELECT w.* FROM vocabulary_words w
        WHERE (?2 IS NULL OR w.difficulty = ?2)
          AND w.id NOT IN (SELECT word_id FROM vocabulary_progress WHERE user_id = ?1)
        ORDER BY w.frequency_rank
        LIMIT ?3
        "#,
    )
    .bind(user_id)
    .bind(difficulty)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_word).collect()
}

/// Random catalog word (last-resort selection fallback)
pub async fn load_random_word(pool: &SqlitePool) -> Result<Option<VocabularyWord>> {
    let row = sqlx::query("SELECT * FROM vocabulary_words ORDER BY RANDOM() LIMIT 1")
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_word(&r)).transpose()
}

fn row_to_word(row: &SqliteRow) -> Result<VocabularyWord> {
    let category: String = row.get("category");
    let difficulty: String = row.get("difficulty");
    let synonyms: String = row.get("synonyms");
    let antonyms: String = row.get("antonyms");

    Ok(VocabularyWord {
        id: row.get("id"),
        word: row.get("word"),
        part_of_speech: row.get("part_of_speech"),
        definition: row.get("definition"),
        example_sentence: row.get("example_sentence"),
        ipa_pronunciation: row.get("ipa_pronunciation"),
        category: category.parse()?,
        subcategory: row.get("subcategory"),
        difficulty: difficulty.parse()?,
        frequency_rank: row.get("frequency_rank"),
        portuguese_translation: row.get("portuguese_translation"),
        synonyms: serde_json::from_str(&synonyms)?,
        antonyms: serde_json::from_str(&antonyms)?,
    })
}

// ==================== progress ====================

/// Insert or update per-user word progress
pub async fn save_progress(pool: &SqlitePool, progress: &VocabularyProgress) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vocabulary_progress (
            id, user_id, word_id, word, mastery_level, practice_count,
            correct_count, last_practiced, ease_factor, interval_days,
            repetitions, next_review, last_review, average_response_time_ms,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, word_id) DO UPDATE SET
            mastery_level = excluded.mastery_level,
            practice_count = excluded.practice_count,
            correct_count = excluded.correct_count,
            last_practiced = excluded.last_practiced,
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions = excluded.repetitions,
            next_review = excluded.next_review,
            last_review = excluded.last_review,
            average_response_time_ms = excluded.average_response_time_ms,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&progress.id)
    .bind(&progress.user_id)
    .bind(&progress.word_id)
    .bind(&progress.word)
    .bind(progress.mastery_level.as_str())
    .bind(progress.practice_count)
    .bind(progress.correct_count)
    .bind(progress.last_practiced.map(|t| t.to_rfc3339()))
    .bind(progress.srs.ease_factor)
    .bind(progress.srs.interval_days)
    .bind(progress.srs.repetitions)
    .bind(progress.srs.next_review.to_rfc3339())
    .bind(progress.srs.last_review.map(|t| t.to_rfc3339()))
    .bind(progress.average_response_time_ms)
    .bind(progress.created_at.to_rfc3339())
    .bind(progress.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one user/word progress record
pub async fn load_progress(
    pool: &SqlitePool,
    user_id: &str,
    word_id: &str,
) -> Result<Option<VocabularyProgress>> {
    let row = sqlx::query("SELECT * FROM vocabulary_progress WHERE user_id = ? AND word_id = ?")
        .bind(user_id)
        .bind(word_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_progress(&r)).transpose()
}

/// All progress records for a user
pub async fn load_all_progress(pool: &SqlitePool, user_id: &str) -> Result<Vec<VocabularyProgress>> {
    let rows = sqlx::query("SELECT * FROM vocabulary_progress WHERE user_id = ? ORDER BY updated_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_progress).collect()
}

/// Words due for review, most overdue first
pub async fn load_due_words(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<VocabularyProgress>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM vocabulary_progress
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

/// Words unpracticed for 7+ days
pub async fn load_low_frequency_words(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<VocabularyProgress>> {
    let cutoff = now - Duration::days(crate::srs::LOW_FREQUENCY_DAYS);
    let rows = sqlx::query(
        r#"
        SELECT * FROM vocabulary_progress
        WHERE user_id = ? AND (last_practiced IS NULL OR last_practiced < ?)
        ORDER BY last_practiced
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(cutoff.to_rfc3339())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_progress).collect()
}

/// (words studied, words mastered) for a user
pub async fn progress_counts(pool: &SqlitePool, user_id: &str) -> Result<(i64, i64)> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(CASE WHEN mastery_level = 'mastered' THEN 1 ELSE 0 END), 0) AS mastered
        FROM vocabulary_progress
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok((row.get("total"), row.get("mastered")))
}

/// Count of words due for review right now
pub async fn due_count(pool: &SqlitePool, user_id: &str, now: DateTime<Utc>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM vocabulary_progress WHERE user_id = ? AND next_review <= ?",
    )
    .bind(user_id)
    .bind(now.to_rfc3339())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

fn row_to_progress(row: &SqliteRow) -> Result<VocabularyProgress> {
    let mastery: String = row.get("mastery_level");
    let next_review: String = row.get("next_review");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(VocabularyProgress {
        id: row.get("id"),
        user_id: row.get("user_id"),
        word_id: row.get("word_id"),
        word: row.get("word"),
        mastery_level: mastery.parse()?,
        practice_count: row.get("practice_count"),
        correct_count: row.get("correct_count"),
        last_practiced: parse_opt_timestamp(row.get("last_practiced"))?,
        srs: SrsRecord {
            ease_factor: row.get("ease_factor"),
            interval_days: row.get("interval_days"),
            repetitions: row.get("repetitions"),
            next_review: parse_timestamp(&next_review)?,
            last_review: parse_opt_timestamp(row.get("last_review"))?,
        },
        average_response_time_ms: row.get("average_response_time_ms"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::{create_vocabulary_progress_table, create_vocabulary_words_table};
    use crate::models::vocabulary::MasteryLevel;
    use crate::models::Difficulty;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_vocabulary_words_table(&pool).await.unwrap();
        create_vocabulary_progress_table(&pool).await.unwrap();
        pool
    }

    fn word(id: &str, rank: i64, difficulty: Difficulty) -> VocabularyWord {
        VocabularyWord {
            id: id.to_string(),
            word: format!("word-{}", id),
            part_of_speech: "noun".to_string(),
            definition: "a thing".to_string(),
            example_sentence: format!("This is word-{} in a sentence.", id),
            ipa_pronunciation: "wɜːd".to_string(),
            category: crate::models::vocabulary::WordCategory::Common,
            subcategory: None,
            difficulty,
            frequency_rank: rank,
            portuguese_translation: Some("palavra".to_string()),
            synonyms: vec![],
            antonyms: vec![],
        }
    }

    #[tokio::test]
    async fn unpracticed_words_exclude_seen_and_order_by_rank() {
        let pool = test_pool().await;
        save_word(&pool, &word("w1", 3, Difficulty::Beginner)).await.unwrap();
        save_word(&pool, &word("w2", 1, Difficulty::Beginner)).await.unwrap();
        save_word(&pool, &word("w3", 2, Difficulty::Advanced)).await.unwrap();

        // mark w2 as already practiced
        let progress = VocabularyProgress::new("u1", "w2", "word-w2");
        save_progress(&pool, &progress).await.unwrap();

        let fresh = load_unpracticed_words(&pool, "u1", Some("beginner"), 10)
            .await
            .unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "w1");

        // without difficulty filter the advanced word shows up first by rank
        let all = load_unpracticed_words(&pool, "u1", None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "w3");
    }

    #[tokio::test]
    async fn due_words_ordered_most_overdue_first() {
        let pool = test_pool().await;
        let now = Utc::now();

        let mut overdue = VocabularyProgress::new("u1", "w1", "word-w1");
        overdue.srs.next_review = now - Duration::days(5);
        save_progress(&pool, &overdue).await.unwrap();

        let mut barely_due = VocabularyProgress::new("u1", "w2", "word-w2");
        barely_due.srs.next_review = now - Duration::hours(1);
        save_progress(&pool, &barely_due).await.unwrap();

        let mut future = VocabularyProgress::new("u1", "w3", "word-w3");
        future.srs.next_review = now + Duration::days(3);
        save_progress(&pool, &future).await.unwrap();

        let due = load_due_words(&pool, "u1", now, 10).await.unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].word_id, "w1");
        assert_eq!(due[1].word_id, "w2");
        assert_eq!(due_count(&pool, "u1", now).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn progress_upsert_and_counts() {
        let pool = test_pool().await;
        let mut progress = VocabularyProgress::new("u1", "w1", "word-w1");
        save_progress(&pool, &progress).await.unwrap();

        progress.practice_count = 6;
        progress.correct_count = 6;
        progress.mastery_level = MasteryLevel::Mastered;
        save_progress(&pool, &progress).await.unwrap();

        let loaded = load_progress(&pool, "u1", "w1").await.unwrap().unwrap();
        assert_eq!(loaded.practice_count, 6);
        assert_eq!(loaded.mastery_level, MasteryLevel::Mastered);

        let (total, mastered) = progress_counts(&pool, "u1").await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(mastered, 1);
    }
}
