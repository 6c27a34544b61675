//! Built-in phonetic sound catalog
//!
//! The high-difficulty entries are the sounds absent from Brazilian
//! Portuguese; those get selection priority in pronunciation exercises.

use lingua_common::models::pronunciation::{MouthPosition, PhoneticSound, SoundDifficulty};

struct SoundSpec {
    id: &'static str,
    phoneme: &'static str,
    name: &'static str,
    exists_in_portuguese: bool,
    difficulty: SoundDifficulty,
    tongue: &'static str,
    lips: &'static str,
    teeth: Option<&'static str>,
    airflow: Option<&'static str>,
    voicing: Option<&'static str>,
    example_words: &'static [&'static str],
    common_mistake: &'static str,
    portuguese_similar: Option<&'static str>,
    tip: &'static str,
}

fn build(spec: SoundSpec) -> PhoneticSound {
    PhoneticSound {
        id: spec.id.to_string(),
        phoneme: spec.phoneme.to_string(),
        name: spec.name.to_string(),
        exists_in_portuguese: spec.exists_in_portuguese,
        difficulty: spec.difficulty,
        mouth_position: MouthPosition {
            tongue: spec.tongue.to_string(),
            lips: spec.lips.to_string(),
            teeth: spec.teeth.map(String::from),
            airflow: spec.airflow.map(String::from),
            voicing: spec.voicing.map(String::from),
        },
        example_words: spec.example_words.iter().map(|s| s.to_string()).collect(),
        common_mistake: spec.common_mistake.to_string(),
        portuguese_similar: spec.portuguese_similar.map(String::from),
        tip: spec.tip.to_string(),
    }
}

/// The built-in phonetic sound catalog
pub fn builtin_sounds() -> Vec<PhoneticSound> {
    use SoundDifficulty::*;

    vec![
        build(SoundSpec {
            id: "sound_theta",
            phoneme: "θ",
            name: "voiceless dental fricative",
            exists_in_portuguese: false,
            difficulty: High,
            tongue: "Tip lightly between the front teeth",
            lips: "Relaxed, slightly open",
            teeth: Some("Tongue tip visible between upper and lower teeth"),
            airflow: Some("Continuous air over the tongue"),
            voicing: Some("Voiceless"),
            example_words: &["think", "three", "mouth", "birthday"],
            common_mistake: "Replacing with /t/ or /f/: 'tink' or 'fink' for 'think'",
            portuguese_similar: None,
            tip: "Gently bite the tip of your tongue and blow air. You should feel the air on your hand.",
        }),
        build(SoundSpec {
            id: "sound_eth",
            phoneme: "ð",
            name: "voiced dental fricative",
            exists_in_portuguese: false,
            difficulty: High,
            tongue: "Tip lightly between the front teeth",
            lips: "Relaxed, slightly open",
            teeth: Some("Same position as θ"),
            airflow: Some("Continuous air with voice"),
            voicing: Some("Voiced"),
            example_words: &["this", "mother", "weather", "together"],
            common_mistake: "Replacing with /d/: 'dis' for 'this'",
            portuguese_similar: None,
            tip: "Same tongue position as θ, but turn your voice on. Your throat should vibrate.",
        }),
        build(SoundSpec {
            id: "sound_ae",
            phoneme: "æ",
            name: "near-open front vowel",
            exists_in_portuguese: false,
            difficulty: High,
            tongue: "Low and forward",
            lips: "Spread wide, jaw dropped",
            teeth: None,
            airflow: None,
            voicing: Some("Voiced"),
            example_words: &["cat", "apple", "happy", "hand"],
            common_mistake: "Using Portuguese /ɛ/: 'ket' for 'cat', merging 'bad' and 'bed'",
            portuguese_similar: Some("Between the 'é' of 'pé' and the 'a' of 'pá'"),
            tip: "Open your jaw wider than for 'é' and smile slightly. 'Cat' and 'ket' must sound different.",
        }),
        build(SoundSpec {
            id: "sound_ih",
            phoneme: "ɪ",
            name: "near-close front vowel",
            exists_in_portuguese: false,
            difficulty: Medium,
            tongue: "High and forward, but lower and more relaxed than /iː/",
            lips: "Relaxed, not spread",
            teeth: None,
            airflow: None,
            voicing: Some("Voiced"),
            example_words: &["ship", "sit", "gym", "fish"],
            common_mistake: "Using tense /iː/ so 'ship' sounds like 'sheep'",
            portuguese_similar: Some("Shorter and more relaxed than the Portuguese 'i'"),
            tip: "Relax your tongue from the 'i' of 'vida' and shorten it. 'Ship' is quick, 'sheep' is long.",
        }),
        build(SoundSpec {
            id: "sound_uh",
            phoneme: "ʊ",
            name: "near-close back vowel",
            exists_in_portuguese: false,
            difficulty: Medium,
            tongue: "High and back, relaxed",
            lips: "Slightly rounded",
            teeth: None,
            airflow: None,
            voicing: Some("Voiced"),
            example_words: &["book", "good", "put", "full"],
            common_mistake: "Using tense /uː/ so 'full' sounds like 'fool'",
            portuguese_similar: Some("Shorter and more relaxed than the Portuguese 'u'"),
            tip: "Start from the 'u' of 'tudo', relax your lips and shorten the sound.",
        }),
        build(SoundSpec {
            id: "sound_r",
            phoneme: "ɹ",
            name: "alveolar approximant",
            exists_in_portuguese: false,
            difficulty: High,
            tongue: "Curled back or bunched, never touching the roof of the mouth",
            lips: "Slightly rounded",
            teeth: None,
            airflow: Some("Smooth, no friction"),
            voicing: Some("Voiced"),
            example_words: &["red", "car", "around", "world"],
            common_mistake: "Using the Portuguese tapped or guttural r: 'hed' for 'red'",
            portuguese_similar: None,
            tip: "Your tongue must not touch anything. Round your lips a little and glide into the vowel.",
        }),
        build(SoundSpec {
            id: "sound_ng",
            phoneme: "ŋ",
            name: "velar nasal",
            exists_in_portuguese: false,
            difficulty: Medium,
            tongue: "Back of the tongue against the soft palate",
            lips: "Open",
            teeth: None,
            airflow: Some("Through the nose"),
            voicing: Some("Voiced"),
            example_words: &["sing", "going", "thing", "long"],
            common_mistake: "Adding a hard /g/ or /k/ at the end: 'sing-g'",
            portuguese_similar: Some("The nasalization in 'manga', without finishing the g"),
            tip: "Say 'sing' and hold the final sound. Your mouth stays open; no g release.",
        }),
        build(SoundSpec {
            id: "sound_h",
            phoneme: "h",
            name: "voiceless glottal fricative",
            exists_in_portuguese: false,
            difficulty: Low,
            tongue: "Neutral, in position for the next vowel",
            lips: "Neutral",
            teeth: None,
            airflow: Some("A light puff from the throat"),
            voicing: Some("Voiceless"),
            example_words: &["house", "hello", "behind", "perhaps"],
            common_mistake: "Dropping it ('ouse') or strengthening it into the Portuguese rr",
            portuguese_similar: Some("Softer than the 'rr' of 'carro' in most accents"),
            tip: "Breathe out gently as if fogging a mirror, then start the vowel.",
        }),
    ]
}
