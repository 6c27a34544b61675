//! Built-in learning content
//!
//! Word, rule, sound, and topic catalogs seeded into the database on
//! startup. Seeding is idempotent: a non-empty catalog table is left
//! alone so deployments can replace the content out of band.

mod rules;
mod sounds;
mod topics;
mod words;

pub use rules::builtin_rules;
pub use sounds::builtin_sounds;
pub use topics::builtin_topics;
pub use words::builtin_words;

use lingua_common::{db, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Seed all catalogs that are currently empty
pub async fn seed_catalogs(pool: &SqlitePool) -> Result<()> {
    if db::vocabulary::count_words(pool).await? == 0 {
        let words = builtin_words();
        for word in &words {
            db::vocabulary::save_word(pool, word).await?;
        }
        info!("Seeded {} vocabulary words", words.len());
    }

    if db::grammar::count_rules(pool).await? == 0 {
        let rules = builtin_rules();
        for rule in &rules {
            db::grammar::save_rule(pool, rule).await?;
        }
        info!("Seeded {} grammar rules", rules.len());
    }

    if db::pronunciation::count_sounds(pool).await? == 0 {
        let sounds = builtin_sounds();
        for sound in &sounds {
            db::pronunciation::save_sound(pool, sound).await?;
        }
        info!("Seeded {} phonetic sounds", sounds.len());
    }

    if db::sessions::count_topics(pool).await? == 0 {
        let topics = builtin_topics();
        for topic in &topics {
            db::sessions::save_topic(pool, topic).await?;
        }
        info!("Seeded {} conversation topics", topics.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_common::db::init::init_database;
    use tempfile::TempDir;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("seed.db")).await.unwrap();

        seed_catalogs(&pool).await.unwrap();
        let first = db::vocabulary::count_words(&pool).await.unwrap();
        assert!(first > 0);

        seed_catalogs(&pool).await.unwrap();
        assert_eq!(db::vocabulary::count_words(&pool).await.unwrap(), first);
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<String> = builtin_words().into_iter().map(|w| w.id).collect();
        ids.extend(builtin_rules().into_iter().map(|r| r.id));
        ids.extend(builtin_sounds().into_iter().map(|s| s.id));
        ids.extend(builtin_topics().into_iter().map(|t| t.id));

        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn every_word_has_an_example_containing_it() {
        for word in builtin_words() {
            assert!(
                word.example_sentence.to_lowercase().contains(&word.word.to_lowercase()),
                "example for {} does not contain the word",
                word.word
            );
        }
    }
}
