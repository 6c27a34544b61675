//! Built-in vocabulary word catalog

use lingua_common::models::vocabulary::{VocabularyWord, WordCategory};
use lingua_common::models::Difficulty;

fn word(
    id: &str,
    word: &str,
    part_of_speech: &str,
    definition: &str,
    example_sentence: &str,
    ipa: &str,
    category: WordCategory,
    difficulty: Difficulty,
    frequency_rank: i64,
    translation: &str,
    synonyms: &[&str],
    antonyms: &[&str],
) -> VocabularyWord {
    VocabularyWord {
        id: id.to_string(),
        word: word.to_string(),
        part_of_speech: part_of_speech.to_string(),
        definition: definition.to_string(),
        example_sentence: example_sentence.to_string(),
        ipa_pronunciation: ipa.to_string(),
        category,
        subcategory: None,
        difficulty,
        frequency_rank,
        portuguese_translation: Some(translation.to_string()),
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        antonyms: antonyms.iter().map(|s| s.to_string()).collect(),
    }
}

/// The built-in word catalog, ordered roughly by frequency rank
pub fn builtin_words() -> Vec<VocabularyWord> {
    use Difficulty::*;
    use WordCategory::*;

    vec![
        word(
            "word_house", "house", "noun",
            "A building where people live",
            "They bought a small house near the beach.",
            "/haʊs/", Common, Beginner, 120, "casa", &["home", "residence"], &[],
        ),
        word(
            "word_work", "work", "verb",
            "To do a job or activity to earn money or achieve something",
            "I work at a hospital downtown.",
            "/wɜːrk/", Common, Beginner, 75, "trabalhar", &["labor"], &["rest"],
        ),
        word(
            "word_think", "think", "verb",
            "To use your mind to form ideas or opinions",
            "I think we should leave early.",
            "/θɪŋk/", Common, Beginner, 60, "pensar", &["believe", "consider"], &[],
        ),
        word(
            "word_friend", "friend", "noun",
            "A person you know well and like",
            "My best friend lives in another city.",
            "/frɛnd/", Common, Beginner, 150, "amigo", &["companion", "pal"], &["enemy"],
        ),
        word(
            "word_breakfast", "breakfast", "noun",
            "The first meal of the day",
            "She always eats breakfast before school.",
            "/ˈbrɛkfəst/", Common, Beginner, 900, "café da manhã", &[], &[],
        ),
        word(
            "word_weather", "weather", "noun",
            "The condition of the air: rain, sun, wind, temperature",
            "The weather was perfect for a picnic.",
            "/ˈwɛðər/", Common, Beginner, 650, "tempo (clima)", &["climate"], &[],
        ),
        word(
            "word_cheap", "cheap", "adjective",
            "Costing little money",
            "We found a cheap hotel near the station.",
            "/tʃiːp/", Common, Beginner, 1100, "barato", &["inexpensive"], &["expensive"],
        ),
        word(
            "word_borrow", "borrow", "verb",
            "To take something that you will return later",
            "Can I borrow your pen for a minute?",
            "/ˈbɒroʊ/", Common, Beginner, 1400, "pegar emprestado", &[], &["lend"],
        ),
        word(
            "word_improve", "improve", "verb",
            "To make or become better",
            "Daily practice will improve your English quickly.",
            "/ɪmˈpruːv/", Common, Intermediate, 800, "melhorar", &["enhance"], &["worsen"],
        ),
        word(
            "word_although", "although", "conjunction",
            "Used to introduce a contrast; despite the fact that",
            "Although it was raining, we went for a walk.",
            "/ɔːlˈðoʊ/", Common, Intermediate, 700, "embora", &["though", "even though"], &[],
        ),
        word(
            "word_achieve", "achieve", "verb",
            "To succeed in reaching a goal through effort",
            "She worked hard to achieve her dream of becoming a doctor.",
            "/əˈtʃiːv/", Common, Intermediate, 1200, "alcançar", &["accomplish", "attain"], &["fail"],
        ),
        word(
            "word_reliable", "reliable", "adjective",
            "Able to be trusted to do what is expected",
            "He is a reliable colleague who always meets deadlines.",
            "/rɪˈlaɪəbəl/", Common, Intermediate, 2100, "confiável", &["dependable", "trustworthy"], &["unreliable"],
        ),
        word(
            "word_deadline", "deadline", "noun",
            "The latest time by which something must be finished",
            "The deadline for the report is Friday at noon.",
            "/ˈdɛdlaɪn/", Technical, Intermediate, 2500, "prazo", &["due date"], &[],
        ),
        word(
            "word_feedback", "feedback", "noun",
            "Information about how well someone is doing, used to improve",
            "Her manager gave her helpful feedback on the presentation.",
            "/ˈfiːdbæk/", Technical, Intermediate, 2300, "retorno, avaliação", &["response"], &[],
        ),
        word(
            "word_schedule", "schedule", "noun",
            "A plan of activities with the times they happen",
            "My schedule is full on Tuesday afternoons.",
            "/ˈskɛdʒuːl/", Technical, Intermediate, 1600, "agenda, cronograma", &["timetable", "agenda"], &[],
        ),
        word(
            "word_negotiate", "negotiate", "verb",
            "To discuss something in order to reach an agreement",
            "They met to negotiate the terms of the contract.",
            "/nɪˈɡoʊʃieɪt/", Technical, Advanced, 3800, "negociar", &["bargain"], &[],
        ),
        word(
            "word_hypothesis", "hypothesis", "noun",
            "An idea proposed as a starting point for investigation",
            "The experiment was designed to test her hypothesis.",
            "/haɪˈpɒθəsɪs/", Academic, Advanced, 5200, "hipótese", &["theory", "assumption"], &[],
        ),
        word(
            "word_nevertheless", "nevertheless", "adverb",
            "In spite of what was just said; however",
            "The task was difficult; nevertheless, they finished on time.",
            "/ˌnɛvərðəˈlɛs/", Academic, Advanced, 4500, "no entanto", &["nonetheless", "however"], &[],
        ),
        word(
            "word_significant", "significant", "adjective",
            "Large or important enough to be noticed or to matter",
            "There was a significant increase in sales last quarter.",
            "/sɪɡˈnɪfɪkənt/", Academic, Intermediate, 1900, "significativo", &["notable", "considerable"], &["insignificant"],
        ),
        word(
            "word_piece_of_cake", "piece of cake", "idiom",
            "Something very easy to do",
            "The test was a piece of cake after all that studying.",
            "/piːs əv keɪk/", Idiom, Intermediate, 6000, "moleza, muito fácil", &["easy"], &[],
        ),
        word(
            "word_break_the_ice", "break the ice", "idiom",
            "To say or do something to make people feel relaxed when they first meet",
            "He told a joke to break the ice at the meeting.",
            "/breɪk ðə aɪs/", Idiom, Advanced, 6500, "quebrar o gelo", &[], &[],
        ),
        word(
            "word_rather", "rather", "adverb",
            "To a certain degree; or used to express preference",
            "I would rather stay home tonight.",
            "/ˈræðər/", Common, Intermediate, 950, "preferir; um tanto", &["somewhat", "instead"], &[],
        ),
    ]
}
