//! Grammar rule catalog and progress persistence

use super::{parse_opt_timestamp, parse_timestamp};
use crate::models::grammar::{GrammarProgress, GrammarRule};
use crate::srs::SrsRecord;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

// ==================== catalog ====================

/// Insert or update a catalog rule (seeding path)
pub async fn save_rule(pool: &SqlitePool, rule: &GrammarRule) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO grammar_rules (
            id, name, category, difficulty, english_explanation,
            portuguese_explanation, exists_in_portuguese, portuguese_equivalent,
            common_mistakes, examples, common_errors
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            english_explanation = excluded.english_explanation,
            examples = excluded.examples
        "#,
    )
    .bind(&rule.id)
    .bind(&rule.name)
    .bind(&rule.category)
    .bind(rule.difficulty.as_str())
    .bind(&rule.english_explanation)
    .bind(&rule.portuguese_explanation)
    .bind(rule.exists_in_portuguese)
    .bind(&rule.portuguese_equivalent)
    .bind(serde_json::to_string(&rule.common_mistakes)?)
    .bind(serde_json::to_string(&rule.examples)?)
    .bind(serde_json::to_string(&rule.common_errors)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a catalog rule by id
pub async fn load_rule(pool: &SqlitePool, id: &str) -> Result<Option<GrammarRule>> {
    let row = sqlx::query("SELECT * FROM grammar_rules WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_rule(&r)).transpose()
}

/// All catalog rules, optionally filtered by difficulty
pub async fn list_rules(pool: &SqlitePool, difficulty: Option<&str>) -> Result<Vec<GrammarRule>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM grammar_rules
        WHERE (?1 IS NULL OR difficulty = ?1)
        ORDER BY id
        "#,
    )
    .bind(difficulty)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_rule).collect()
}

/// Count catalog rules (seeding check)
pub async fn count_rules(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grammar_rules")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Rules the user has never practiced, for the given difficulty
pub async fn load_unpracticed_rules(
    pool: &SqlitePool,
    user_id: &str,
    difficulty: Option<&str>,
    limit: i64,
) -> Result<Vec<GrammarRule>> {
    let rows = sqlx::query(
        r#"
        SELECT r.* FROM grammar_rules r
        WHERE (?2 IS NULL OR r.difficulty = ?2)
          AND r.id NOT IN (SELECT rule_id FROM grammar_progress WHERE user_id = ?1)
        ORDER BY r.id
        LIMIT ?3
        "#,
    )
    .bind(user_id)
    .bind(difficulty)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_rule).collect()
}

fn row_to_rule(row: &SqliteRow) -> Result<GrammarRule> {
    let difficulty: String = row.get("difficulty");
    let common_mistakes: String = row.get("common_mistakes");
    let examples: String = row.get("examples");
    let common_errors: String = row.get("common_errors");

    Ok(GrammarRule {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        difficulty: difficulty.parse()?,
        english_explanation: row.get("english_explanation"),
        portuguese_explanation: row.get("portuguese_explanation"),
        exists_in_portuguese: row.get("exists_in_portuguese"),
        portuguese_equivalent: row.get("portuguese_equivalent"),
        common_mistakes: serde_json::from_str(&common_mistakes)?,
        examples: serde_json::from_str(&examples)?,
        common_errors: serde_json::from_str(&common_errors)?,
    })
}

// ==================== progress ====================

/// Insert or update per-user rule progress
pub async fn save_progress(pool: &SqlitePool, progress: &GrammarProgress) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO grammar_progress (
            id, user_id, rule_id, rule_name, practice_count, correct_count,
            last_practiced, last_score, best_explanation_score, ease_factor,
            interval_days, repetitions, next_review, last_review,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, rule_id) DO UPDATE SET
            practice_count = excluded.practice_count,
            correct_count = excluded.correct_count,
            last_practiced = excluded.last_practiced,
            last_score = excluded.last_score,
            best_explanation_score = excluded.best_explanation_score,
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions = excluded.repetitions,
            next_review = excluded.next_review,
            last_review = excluded.last_review,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&progress.id)
    .bind(&progress.user_id)
    .bind(&progress.rule_id)
    .bind(&progress.rule_name)
    .bind(progress.practice_count)
    .bind(progress.correct_count)
    .bind(progress.last_practiced.map(|t| t.to_rfc3339()))
    .bind(progress.last_score)
    .bind(progress.best_explanation_score)
    .bind(progress.srs.ease_factor)
    .bind(progress.srs.interval_days)
    .bind(progress.srs.repetitions)
    .bind(progress.srs.next_review.to_rfc3339())
    .bind(progress.srs.last_review.map(|t| t.to_rfc3339()))
    .bind(progress.created_at.to_rfc3339())
    .bind(progress.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one user/rule progress record
pub async fn load_progress(
    pool: &SqlitePool,
    user_id: &str,
    rule_id: &str,
) -> Result<Option<GrammarProgress>> {
    let row = sqlx::query("SELECT * FROM grammar_progress WHERE user_id = ? AND rule_id = ?")
        .bind(user_id)
        .bind(rule_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_progress(&r)).transpose()
}

/// All rule progress for a user
pub async fn load_all_progress(pool: &SqlitePool, user_id: &str) -> Result<Vec<GrammarProgress>> {
    let rows = sqlx::query("SELECT * FROM grammar_progress WHERE user_id = ? ORDER BY updated_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_progress).collect()
}

/// Rules due for review, most overdue first
pub async fn load_due_rules(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<GrammarProgress>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM grammar_progress
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

/// Rules with a low running score, worst first
pub async fn load_low_score_rules(
    pool: &SqlitePool,
    user_id: &str,
    threshold: f64,
    limit: i64,
) -> Result<Vec<GrammarProgress>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM grammar_progress
        WHERE user_id = ? AND practice_count > 0 AND last_score < ?
        ORDER BY last_score
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(threshold)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_progress).collect()
}

/// (rules practiced, mean of last scores) for a user; (0, 0.0) when none
pub async fn score_summary(pool: &SqlitePool, user_id: &str) -> Result<(i64, f64)> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total, COALESCE(AVG(last_score), 0.0) AS average FROM grammar_progress WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok((row.get("total"), row.get("average")))
}

/// Count of rules due for review right now
pub async fn due_count(pool: &SqlitePool, user_id: &str, now: DateTime<Utc>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM grammar_progress WHERE user_id = ? AND next_review <= ?",
    )
    .bind(user_id)
    .bind(now.to_rfc3339())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

fn row_to_progress(row: &SqliteRow) -> Result<GrammarProgress> {
    let next_review: String = row.get("next_review");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(GrammarProgress {
        id: row.get("id"),
        user_id: row.get("user_id"),
        rule_id: row.get("rule_id"),
        rule_name: row.get("rule_name"),
        practice_count: row.get("practice_count"),
        correct_count: row.get("correct_count"),
        last_practiced: parse_opt_timestamp(row.get("last_practiced"))?,
        last_score: row.get("last_score"),
        best_explanation_score: row.get("best_explanation_score"),
        srs: SrsRecord {
            ease_factor: row.get("ease_factor"),
            interval_days: row.get("interval_days"),
            repetitions: row.get("repetitions"),
            next_review: parse_timestamp(&next_review)?,
            last_review: parse_opt_timestamp(row.get("last_review"))?,
        },
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::{create_grammar_progress_table, create_grammar_rules_table};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_grammar_rules_table(&pool).await.unwrap();
        create_grammar_progress_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn score_summary_averages_last_scores() {
        let pool = test_pool().await;

        let mut first = GrammarProgress::new("u1", "articles", "Articles");
        first.practice_count = 2;
        first.last_score = 80.0;
        save_progress(&pool, &first).await.unwrap();

        let mut second = GrammarProgress::new("u1", "past_simple", "Past Simple");
        second.practice_count = 1;
        second.last_score = 60.0;
        save_progress(&pool, &second).await.unwrap();

        let (total, average) = score_summary(&pool, "u1").await.unwrap();
        assert_eq!(total, 2);
        assert!((average - 70.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn low_score_rules_exclude_unpracticed() {
        let pool = test_pool().await;

        // never practiced, score 0 would otherwise match
        let fresh = GrammarProgress::new("u1", "conditionals", "Conditionals");
        save_progress(&pool, &fresh).await.unwrap();

        let mut weak = GrammarProgress::new("u1", "articles", "Articles");
        weak.practice_count = 3;
        weak.last_score = 55.0;
        save_progress(&pool, &weak).await.unwrap();

        let low = load_low_score_rules(&pool, "u1", 70.0, 10).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].rule_id, "articles");
    }
}
