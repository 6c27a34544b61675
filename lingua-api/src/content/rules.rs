//! Built-in grammar rule catalog
//!
//! Rules picked for where Portuguese and English diverge: Portuguese
//! speakers drop subject pronouns, reuse one present tense where English
//! splits simple/continuous, and have no do-support.

use lingua_common::models::grammar::{CommonError, GrammarExample, GrammarRule};
use lingua_common::models::Difficulty;

struct RuleSpec {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    difficulty: Difficulty,
    english_explanation: &'static str,
    portuguese_explanation: &'static str,
    exists_in_portuguese: bool,
    portuguese_equivalent: Option<&'static str>,
    common_mistakes: &'static [&'static str],
    examples: &'static [(&'static str, &'static str)],
    common_errors: &'static [(&'static str, &'static str, &'static str)],
}

fn build(spec: RuleSpec) -> GrammarRule {
    GrammarRule {
        id: spec.id.to_string(),
        name: spec.name.to_string(),
        category: spec.category.to_string(),
        difficulty: spec.difficulty,
        english_explanation: spec.english_explanation.to_string(),
        portuguese_explanation: Some(spec.portuguese_explanation.to_string()),
        exists_in_portuguese: spec.exists_in_portuguese,
        portuguese_equivalent: spec.portuguese_equivalent.map(String::from),
        common_mistakes: spec.common_mistakes.iter().map(|s| s.to_string()).collect(),
        examples: spec
            .examples
            .iter()
            .map(|(en, pt)| GrammarExample {
                english: en.to_string(),
                portuguese: pt.to_string(),
            })
            .collect(),
        common_errors: spec
            .common_errors
            .iter()
            .map(|(incorrect, correct, explanation)| CommonError {
                incorrect: incorrect.to_string(),
                correct: correct.to_string(),
                explanation: explanation.to_string(),
            })
            .collect(),
    }
}

/// The built-in grammar rule catalog
pub fn builtin_rules() -> Vec<GrammarRule> {
    use Difficulty::*;

    vec![
        build(RuleSpec {
            id: "rule_subject_pronouns",
            name: "Mandatory subject pronouns",
            category: "sentence_structure",
            difficulty: Beginner,
            english_explanation:
                "English sentences need an explicit subject. Unlike Portuguese, the verb \
                 ending does not show who is acting, so the pronoun cannot be dropped.",
            portuguese_explanation:
                "Em inglês o sujeito é sempre obrigatório. 'Está chovendo' vira 'It is \
                 raining', nunca 'Is raining'.",
            exists_in_portuguese: false,
            portuguese_equivalent: None,
            common_mistakes: &["Is raining a lot today", "Arrived late again"],
            examples: &[
                ("It is raining.", "Está chovendo."),
                ("She works downtown.", "Ela trabalha no centro."),
            ],
            common_errors: &[(
                "Is very hot today",
                "It is very hot today",
                "Weather sentences need the dummy subject 'it'",
            )],
        }),
        build(RuleSpec {
            id: "rule_present_simple_third",
            name: "Present simple third person -s",
            category: "verb_tense",
            difficulty: Beginner,
            english_explanation:
                "In the present simple, verbs take -s or -es with he, she, and it: \
                 'she works', 'he watches'.",
            portuguese_explanation:
                "O inglês só muda o verbo na terceira pessoa do singular: 'I work' mas \
                 'she works'. É a única marca pessoal do presente.",
            exists_in_portuguese: true,
            portuguese_equivalent: Some("Conjugação verbal por pessoa"),
            common_mistakes: &["She work every day", "He don't like coffee"],
            examples: &[
                ("She speaks three languages.", "Ela fala três línguas."),
                ("My brother lives in Recife.", "Meu irmão mora em Recife."),
            ],
            common_errors: &[(
                "She work every day",
                "She works every day",
                "Third-person singular subjects take -s in the present simple",
            )],
        }),
        build(RuleSpec {
            id: "rule_do_support",
            name: "Questions and negatives with do/does",
            category: "questions",
            difficulty: Beginner,
            english_explanation:
                "Most verbs form questions and negatives with the auxiliary do/does: \
                 'Do you like it?', 'She does not know'. The main verb stays in the base form.",
            portuguese_explanation:
                "O português faz perguntas só com entonação ('Você gosta?'). O inglês \
                 precisa do auxiliar: 'Do you like it?'.",
            exists_in_portuguese: false,
            portuguese_equivalent: None,
            common_mistakes: &["You like coffee?", "She not know the answer"],
            examples: &[
                ("Do you like coffee?", "Você gosta de café?"),
                ("He doesn't work here.", "Ele não trabalha aqui."),
            ],
            common_errors: &[(
                "You like coffee?",
                "Do you like coffee?",
                "Yes/no questions need the auxiliary 'do' before the subject",
            )],
        }),
        build(RuleSpec {
            id: "rule_articles",
            name: "Indefinite articles with professions",
            category: "articles",
            difficulty: Beginner,
            english_explanation:
                "English uses a/an before singular professions and roles: 'She is a doctor'. \
                 Portuguese drops the article in this position.",
            portuguese_explanation:
                "'Ela é médica' vira 'She is a doctor' — o artigo é obrigatório em inglês \
                 antes de profissões no singular.",
            exists_in_portuguese: false,
            portuguese_equivalent: None,
            common_mistakes: &["I am engineer", "He is teacher"],
            examples: &[
                ("She is a doctor.", "Ela é médica."),
                ("I want to be an engineer.", "Quero ser engenheiro."),
            ],
            common_errors: &[(
                "I am engineer",
                "I am an engineer",
                "Singular professions take a/an",
            )],
        }),
        build(RuleSpec {
            id: "rule_present_continuous",
            name: "Present continuous vs present simple",
            category: "verb_tense",
            difficulty: Intermediate,
            english_explanation:
                "Use the present continuous (am/is/are + -ing) for actions happening now \
                 and the present simple for habits: 'I am studying now' vs 'I study every day'.",
            portuguese_explanation:
                "O 'estar + gerúndio' existe em português, mas o inglês exige a distinção: \
                 hábito usa presente simples, ação em andamento usa continuous.",
            exists_in_portuguese: true,
            portuguese_equivalent: Some("Estar + gerúndio"),
            common_mistakes: &["I am study English every day", "She working now"],
            examples: &[
                ("I am studying right now.", "Estou estudando agora."),
                ("I study every evening.", "Estudo toda noite."),
            ],
            common_errors: &[(
                "She working now",
                "She is working now",
                "The continuous needs the auxiliary be: is/are + -ing",
            )],
        }),
        build(RuleSpec {
            id: "rule_past_simple_irregular",
            name: "Irregular past simple forms",
            category: "verb_tense",
            difficulty: Intermediate,
            english_explanation:
                "Many common verbs have irregular past forms that must be memorized: \
                 go/went, buy/bought, think/thought. Questions still use did + base form.",
            portuguese_explanation:
                "Verbos irregulares não seguem o padrão -ed. Em perguntas com 'did' o \
                 verbo volta à forma base: 'Did you go?', não 'Did you went?'.",
            exists_in_portuguese: true,
            portuguese_equivalent: Some("Verbos irregulares no pretérito"),
            common_mistakes: &["I goed home", "Did you went there?"],
            examples: &[
                ("I went home early.", "Fui para casa cedo."),
                ("Did you buy the tickets?", "Você comprou os ingressos?"),
            ],
            common_errors: &[(
                "Did you went there?",
                "Did you go there?",
                "After 'did' the main verb returns to its base form",
            )],
        }),
        build(RuleSpec {
            id: "rule_countable_uncountable",
            name: "Countable and uncountable nouns",
            category: "nouns",
            difficulty: Intermediate,
            english_explanation:
                "Uncountable nouns (information, advice, money, furniture) have no plural \
                 and take much/little; countable nouns take many/few and can be plural.",
            portuguese_explanation:
                "Palavras como 'information' e 'advice' nunca vão para o plural em inglês, \
                 mesmo que 'informações' e 'conselhos' sejam comuns em português.",
            exists_in_portuguese: false,
            portuguese_equivalent: None,
            common_mistakes: &["She gave me many advices", "I need some informations"],
            examples: &[
                ("She gave me some advice.", "Ela me deu alguns conselhos."),
                ("How much money do you have?", "Quanto dinheiro você tem?"),
            ],
            common_errors: &[(
                "I need some informations",
                "I need some information",
                "'Information' is uncountable and has no plural form",
            )],
        }),
        build(RuleSpec {
            id: "rule_conditionals_second",
            name: "Second conditional",
            category: "conditionals",
            difficulty: Advanced,
            english_explanation:
                "Hypothetical present/future situations use if + past simple in the \
                 condition and would + base form in the result: 'If I had time, I would travel'.",
            portuguese_explanation:
                "Equivale a 'Se eu tivesse..., eu viajaria'. O erro comum é usar 'would' \
                 nas duas orações.",
            exists_in_portuguese: true,
            portuguese_equivalent: Some("Pretérito imperfeito do subjuntivo + futuro do pretérito"),
            common_mistakes: &["If I would have time, I would travel"],
            examples: &[
                (
                    "If I had more time, I would learn Japanese.",
                    "Se eu tivesse mais tempo, aprenderia japonês.",
                ),
            ],
            common_errors: &[(
                "If I would have time, I would travel",
                "If I had time, I would travel",
                "The if-clause takes past simple, not 'would'",
            )],
        }),
    ]
}
