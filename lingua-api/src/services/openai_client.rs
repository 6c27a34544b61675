//! Azure OpenAI chat completion client
//!
//! All LLM traffic in the backend goes through this client: exercise
//! generation, explanation evaluation, conversation replies, grammar
//! error detection. Requests are throttled by an in-process hourly
//! quota; model replies that should be JSON are extracted tolerantly
//! (models like to wrap JSON in prose).

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use lingua_common::config::OpenAiSettings;
use lingua_common::models::grammar::{ExplanationEvaluation, GrammarExercise, GrammarRule};
use lingua_common::models::speaking::GrammarErrorDetail;
use lingua_common::models::user::EnglishLevel;
use lingua_common::models::vocabulary::{VocabularyExercise, VocabularyWord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// LLM client errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM client not configured (missing endpoint or API key)")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One message in a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

type HourlyLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Azure OpenAI chat completion client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    settings: OpenAiSettings,
    limiter: HourlyLimiter,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let per_hour = NonZeroU32::new(settings.requests_per_hour.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_hour(per_hour));

        Ok(Self {
            http_client,
            settings,
            limiter,
        })
    }

    /// Whether endpoint and key are both present
    pub fn is_configured(&self) -> bool {
        !self.settings.endpoint.is_empty() && !self.settings.api_key.is_empty()
    }

    /// Send one chat completion request and return the reply text
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        self.limiter.until_ready().await;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.deployment,
            self.settings.api_version
        );

        tracing::debug!(
            deployment = %self.settings.deployment,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .header("api-key", &self.settings.api_key)
            .json(&json!({
                "messages": messages,
                "max_tokens": max_tokens,
                "temperature": temperature,
            }))
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(status.as_u16(), error_text));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::ParseError("Empty completion".to_string()))
    }

    /// Generate a fill-in-the-blank exercise for a vocabulary word
    pub async fn generate_vocabulary_exercise(
        &self,
        word: &VocabularyWord,
        level: EnglishLevel,
    ) -> Result<VocabularyExercise, LlmError> {
        let messages = [
            ChatMessage::system(
                "You create English vocabulary exercises for Brazilian Portuguese speakers. \
                 Reply with a single JSON object only, no prose. Keys: sentence (with ___ \
                 where the word goes), options (4 strings including the correct word), \
                 correct_answer, correct_index (0-3), explanation, example_usage.",
            ),
            ChatMessage::user(format!(
                "Create a fill-in-the-blank exercise for the word \"{}\" ({}, {}). \
                 Definition: {}. Learner level: {}.",
                word.word, word.part_of_speech, word.difficulty, word.definition, level
            )),
        ];

        let reply = self
            .chat_completion(&messages, self.settings.max_tokens, self.settings.temperature)
            .await?;

        let payload = extract_json(&reply)
            .ok_or_else(|| LlmError::ParseError("No JSON object in reply".to_string()))?;

        #[derive(Deserialize)]
        struct GeneratedExercise {
            sentence: String,
            options: Vec<String>,
            correct_answer: String,
            correct_index: i64,
            explanation: String,
            example_usage: Option<String>,
        }

        let generated: GeneratedExercise = serde_json::from_str(payload)
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        Ok(VocabularyExercise {
            word_id: word.id.clone(),
            word: word.word.clone(),
            exercise_type: "fill_in_the_blank".to_string(),
            sentence: generated.sentence,
            options: generated.options,
            correct_answer: generated.correct_answer,
            correct_index: generated.correct_index,
            explanation: generated.explanation,
            example_usage: generated.example_usage,
            context: word.definition.clone(),
        })
    }

    /// Score a user's explanation of a grammar rule
    pub async fn evaluate_explanation(
        &self,
        rule: &GrammarRule,
        explanation: &str,
    ) -> Result<ExplanationEvaluation, LlmError> {
        let messages = [
            ChatMessage::system(
                "You evaluate how well an English learner explained a grammar rule. \
                 Reply with a single JSON object only. Keys: accuracy_score, \
                 completeness_score, understanding_score, overall_score (all 0-100), \
                 feedback (short, encouraging, in Portuguese), missing_points (array), \
                 suggestions.",
            ),
            ChatMessage::user(format!(
                "Rule: {} ({}). Reference explanation: {}. Learner's explanation: {}",
                rule.name, rule.category, rule.english_explanation, explanation
            )),
        ];

        // Scoring wants consistency over creativity
        let reply = self.chat_completion(&messages, self.settings.max_tokens, 0.3).await?;

        let payload = extract_json(&reply)
            .ok_or_else(|| LlmError::ParseError("No JSON object in reply".to_string()))?;

        serde_json::from_str(payload).map_err(|e| LlmError::ParseError(e.to_string()))
    }

    /// Generate practice exercises for a grammar rule
    pub async fn generate_grammar_exercises(
        &self,
        rule: &GrammarRule,
        count: usize,
        level: EnglishLevel,
    ) -> Result<Vec<GrammarExercise>, LlmError> {
        let messages = [
            ChatMessage::system(
                "You create English grammar exercises for Brazilian Portuguese speakers. \
                 Reply with a single JSON object only: {\"exercises\": [...]}. Each \
                 exercise has: exercise_type (fill_in_the_blank or multiple_choice), \
                 instruction, sentence, options (array or null), correct_answer, \
                 correct_index (number or null), explanation.",
            ),
            ChatMessage::user(format!(
                "Create {} exercises for the rule \"{}\": {}. Learner level: {}.",
                count, rule.name, rule.english_explanation, level
            )),
        ];

        let reply = self
            .chat_completion(&messages, self.settings.max_tokens, self.settings.temperature)
            .await?;

        let payload = extract_json(&reply)
            .ok_or_else(|| LlmError::ParseError("No JSON object in reply".to_string()))?;

        #[derive(Deserialize)]
        struct GeneratedExercises {
            exercises: Vec<GeneratedExercise>,
        }

        #[derive(Deserialize)]
        struct GeneratedExercise {
            exercise_type: String,
            instruction: String,
            sentence: String,
            options: Option<Vec<String>>,
            correct_answer: String,
            correct_index: Option<i64>,
            explanation: String,
        }

        let generated: GeneratedExercises = serde_json::from_str(payload)
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        Ok(generated
            .exercises
            .into_iter()
            .map(|e| GrammarExercise {
                rule_id: rule.id.clone(),
                exercise_type: e.exercise_type,
                instruction: e.instruction,
                sentence: e.sentence,
                options: e.options,
                correct_answer: e.correct_answer,
                correct_index: e.correct_index,
                explanation: e.explanation,
            })
            .collect())
    }

    /// Produce the agent's next conversational turn
    pub async fn conversation_reply(
        &self,
        topic_name: &str,
        history: &[(String, String)],
        user_text: &str,
        level: EnglishLevel,
    ) -> Result<String, LlmError> {
        let style = match level {
            EnglishLevel::Beginner => {
                "Use short, simple sentences and common words. Ask one easy follow-up question."
            }
            EnglishLevel::Intermediate => {
                "Use natural conversational English. Ask an open follow-up question."
            }
        };

        let mut messages = vec![ChatMessage::system(format!(
            "You are a friendly English conversation partner talking about \"{}\" \
             with a Brazilian learner. {} Keep replies under 3 sentences.",
            topic_name, style
        ))];
        for (speaker, text) in history {
            if speaker == "user" {
                messages.push(ChatMessage::user(text.clone()));
            } else {
                messages.push(ChatMessage::assistant(text.clone()));
            }
        }
        messages.push(ChatMessage::user(user_text.to_string()));

        self.chat_completion(&messages, 150, 0.8).await
    }

    /// Detect grammar mistakes in a user's utterance.
    ///
    /// An unparseable reply counts as no errors found; error detection is
    /// best-effort and must never fail a conversation turn.
    pub async fn detect_grammar_errors(&self, text: &str) -> Result<Vec<GrammarErrorDetail>, LlmError> {
        let messages = [
            ChatMessage::system(
                "You detect grammar mistakes made by Brazilian Portuguese speakers \
                 learning English. Reply with a single JSON object only: \
                 {\"errors\": [...]}. Each error has: rule (short rule name), \
                 incorrect_text, correction, explanation (in Portuguese). \
                 Ignore punctuation and capitalization. Empty array if correct.",
            ),
            ChatMessage::user(text.to_string()),
        ];

        let reply = self.chat_completion(&messages, self.settings.max_tokens, 0.2).await?;

        #[derive(Deserialize)]
        struct DetectedErrors {
            errors: Vec<GrammarErrorDetail>,
        }

        let detected = extract_json(&reply)
            .and_then(|payload| serde_json::from_str::<DetectedErrors>(payload).ok());

        Ok(detected.map(|d| d.errors).unwrap_or_default())
    }

    /// Explain a grammar rule by contrast with Portuguese
    pub async fn portuguese_contrast(&self, rule: &GrammarRule) -> Result<String, LlmError> {
        let contrast = if rule.exists_in_portuguese {
            format!(
                "The rule has a Portuguese counterpart: {}.",
                rule.portuguese_equivalent.as_deref().unwrap_or("similar construction")
            )
        } else {
            "The rule has no direct Portuguese counterpart.".to_string()
        };

        let messages = [
            ChatMessage::system(
                "You explain English grammar to Brazilian Portuguese speakers, in \
                 Portuguese, contrasting with how Portuguese works. Be concise and \
                 concrete, with one example pair.",
            ),
            ChatMessage::user(format!(
                "Explain the rule \"{}\": {}. {}",
                rule.name, rule.english_explanation, contrast
            )),
        ];

        self.chat_completion(&messages, self.settings.max_tokens, 0.5).await
    }
}

/// Extract the outermost JSON object from a model reply.
///
/// Models often wrap the requested JSON in prose or code fences; take
/// everything from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_strips_surrounding_prose() {
        let reply = "Sure! Here is the exercise:\n```json\n{\"a\": 1}\n```\nEnjoy!";
        assert_eq!(extract_json(reply), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_json_passes_bare_object_through() {
        assert_eq!(extract_json("{\"a\": 1}"), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_json_handles_nested_objects() {
        let reply = "prefix {\"outer\": {\"inner\": 2}} suffix";
        assert_eq!(extract_json(reply), Some("{\"outer\": {\"inner\": 2}}"));
    }

    #[test]
    fn extract_json_rejects_no_object() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} reversed {"), None);
    }

    #[test]
    fn unconfigured_client_is_flagged() {
        let client = OpenAiClient::new(OpenAiSettings::default()).unwrap();
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn unconfigured_client_fails_fast() {
        let client = OpenAiClient::new(OpenAiSettings::default()).unwrap();
        let result = client
            .chat_completion(&[ChatMessage::user("hello")], 100, 0.7)
            .await;
        assert!(matches!(result, Err(LlmError::NotConfigured)));
    }
}
