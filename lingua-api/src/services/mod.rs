//! External service clients
//!
//! Plain REST clients over the managed services the agents depend on:
//! Azure OpenAI chat completions and Azure Speech (TTS/STT/pronunciation
//! assessment). No vendor SDKs; each client owns its error enum and its
//! own rate limiting.

pub mod openai_client;
pub mod speech_client;

pub use openai_client::{ChatMessage, LlmError, OpenAiClient};
pub use speech_client::{
    PhonemeScore, PronunciationAssessment, SpeechError, SpeechClient, Transcription, WordScore,
};

// Client errors surface to callers as upstream-service failures
impl From<LlmError> for lingua_common::Error {
    fn from(err: LlmError) -> Self {
        lingua_common::Error::ExternalService(err.to_string())
    }
}

impl From<SpeechError> for lingua_common::Error {
    fn from(err: SpeechError) -> Self {
        lingua_common::Error::ExternalService(err.to_string())
    }
}
