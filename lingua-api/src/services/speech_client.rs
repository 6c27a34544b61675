//! Azure Speech REST client
//!
//! Text-to-speech (SSML), speech-to-text, and pronunciation assessment
//! against the regional Cognitive Services endpoints. Audio travels as
//! raw WAV bytes here; base64 encoding belongs to the API layer.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use lingua_common::config::SpeechSettings;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const TTS_OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

/// Speech client errors
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech client not configured (missing API key)")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("No speech recognized")]
    NoSpeechRecognized,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// STT result
#[derive(Debug, Clone, Serialize)]
pub struct Transcription {
    pub text: String,
    pub confidence: f64,
}

/// Per-phoneme accuracy from pronunciation assessment
#[derive(Debug, Clone, Serialize)]
pub struct PhonemeScore {
    pub phoneme: String,
    pub accuracy_score: f64,
}

/// Per-word accuracy from pronunciation assessment
#[derive(Debug, Clone, Serialize)]
pub struct WordScore {
    pub word: String,
    pub accuracy_score: f64,
    pub error_type: Option<String>,
    pub phonemes: Vec<PhonemeScore>,
}

/// Full pronunciation assessment result
#[derive(Debug, Clone, Serialize)]
pub struct PronunciationAssessment {
    pub recognized_text: String,
    pub accuracy_score: f64,
    pub fluency_score: f64,
    pub completeness_score: f64,
    pub pronunciation_score: f64,
    pub words: Vec<WordScore>,
    pub feedback: String,
}

/// Azure Speech REST client
pub struct SpeechClient {
    http_client: reqwest::Client,
    settings: SpeechSettings,
}

impl SpeechClient {
    pub fn new(settings: SpeechSettings) -> Result<Self, SpeechError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SpeechError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.settings.api_key.is_empty()
    }

    fn tts_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.settings.region
        )
    }

    fn stt_url(&self) -> String {
        format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}&format=detailed&profanity=raw",
            self.settings.region, self.settings.language
        )
    }

    /// Synthesize speech for a text, returning WAV bytes
    pub async fn synthesize(&self, text: &str, voice_preference: &str) -> Result<Vec<u8>, SpeechError> {
        if !self.is_configured() {
            return Err(SpeechError::NotConfigured);
        }

        let voice = voice_name(voice_preference);
        let ssml = format!(
            r#"<speak version='1.0' xml:lang='en-US'><voice name='{}'>{}</voice></speak>"#,
            voice,
            escape_ssml(text)
        );

        tracing::debug!(voice = %voice, chars = text.len(), "Synthesizing speech");

        let response = self
            .http_client
            .post(self.tts_url())
            .header("Ocp-Apim-Subscription-Key", &self.settings.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", TTS_OUTPUT_FORMAT)
            .body(ssml)
            .send()
            .await
            .map_err(|e| SpeechError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::ApiError(status.as_u16(), error_text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::NetworkError(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    /// Recognize speech from WAV bytes
    pub async fn recognize(&self, audio: &[u8]) -> Result<Transcription, SpeechError> {
        let body = self.send_recognition(audio, None).await?;
        parse_transcription(&body)
    }

    /// Run pronunciation assessment against a reference text
    pub async fn assess_pronunciation(
        &self,
        audio: &[u8],
        reference_text: &str,
    ) -> Result<PronunciationAssessment, SpeechError> {
        let params = json!({
            "ReferenceText": reference_text,
            "GradingSystem": "HundredMark",
            "Granularity": "Phoneme",
            "Dimension": "Comprehensive",
        });
        let header = BASE64.encode(params.to_string());

        let body = self.send_recognition(audio, Some(&header)).await?;
        parse_assessment(&body)
    }

    async fn send_recognition(
        &self,
        audio: &[u8],
        assessment_header: Option<&str>,
    ) -> Result<serde_json::Value, SpeechError> {
        if !self.is_configured() {
            return Err(SpeechError::NotConfigured);
        }

        let mut request = self
            .http_client
            .post(self.stt_url())
            .header("Ocp-Apim-Subscription-Key", &self.settings.api_key)
            .header("Content-Type", "audio/wav; codecs=audio/pcm; samplerate=16000")
            .header("Accept", "application/json");

        if let Some(header) = assessment_header {
            request = request.header("Pronunciation-Assessment", header);
        }

        let response = request
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| SpeechError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| SpeechError::ParseError(e.to_string()))
    }
}

/// Map a stored voice preference to an Azure neural voice name
pub fn voice_name(preference: &str) -> &'static str {
    match preference {
        "american_male" => "en-US-GuyNeural",
        "british_female" => "en-GB-SoniaNeural",
        "british_male" => "en-GB-RyanNeural",
        // american_female, and anything unrecognized
        _ => "en-US-JennyNeural",
    }
}

/// Feedback tier for an overall accuracy score
pub fn accuracy_feedback(accuracy: f64) -> &'static str {
    if accuracy >= 85.0 {
        "Excellent pronunciation! Keep it up."
    } else if accuracy >= 70.0 {
        "Good pronunciation. A little more practice will polish it."
    } else if accuracy >= 50.0 {
        "Fair attempt. Listen to the reference again and focus on the marked sounds."
    } else {
        "This sound needs practice. Review the mouth position and try slowly."
    }
}

fn escape_ssml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn parse_transcription(body: &serde_json::Value) -> Result<Transcription, SpeechError> {
    let status = body["RecognitionStatus"].as_str().unwrap_or("");
    if status != "Success" {
        return Err(SpeechError::NoSpeechRecognized);
    }

    let text = body["DisplayText"]
        .as_str()
        .or_else(|| body["NBest"][0]["Display"].as_str())
        .unwrap_or("")
        .to_string();
    if text.is_empty() {
        return Err(SpeechError::NoSpeechRecognized);
    }

    let confidence = body["NBest"][0]["Confidence"].as_f64().unwrap_or(0.0);

    Ok(Transcription { text, confidence })
}

fn parse_assessment(body: &serde_json::Value) -> Result<PronunciationAssessment, SpeechError> {
    let status = body["RecognitionStatus"].as_str().unwrap_or("");
    if status != "Success" {
        return Err(SpeechError::NoSpeechRecognized);
    }

    let best = &body["NBest"][0];
    let scores = &best["PronunciationAssessment"];
    if scores.is_null() {
        return Err(SpeechError::ParseError(
            "Missing PronunciationAssessment block".to_string(),
        ));
    }

    let accuracy = scores["AccuracyScore"].as_f64().unwrap_or(0.0);

    let words = best["Words"]
        .as_array()
        .map(|words| {
            words
                .iter()
                .map(|w| WordScore {
                    word: w["Word"].as_str().unwrap_or("").to_string(),
                    accuracy_score: w["PronunciationAssessment"]["AccuracyScore"]
                        .as_f64()
                        .unwrap_or(0.0),
                    error_type: w["PronunciationAssessment"]["ErrorType"]
                        .as_str()
                        .filter(|t| *t != "None")
                        .map(String::from),
                    phonemes: w["Phonemes"]
                        .as_array()
                        .map(|ps| {
                            ps.iter()
                                .map(|p| PhonemeScore {
                                    phoneme: p["Phoneme"].as_str().unwrap_or("").to_string(),
                                    accuracy_score: p["PronunciationAssessment"]["AccuracyScore"]
                                        .as_f64()
                                        .unwrap_or(0.0),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(PronunciationAssessment {
        recognized_text: best["Display"]
            .as_str()
            .or_else(|| body["DisplayText"].as_str())
            .unwrap_or("")
            .to_string(),
        accuracy_score: accuracy,
        fluency_score: scores["FluencyScore"].as_f64().unwrap_or(0.0),
        completeness_score: scores["CompletenessScore"].as_f64().unwrap_or(0.0),
        pronunciation_score: scores["PronScore"].as_f64().unwrap_or(0.0),
        words,
        feedback: accuracy_feedback(accuracy).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_map_covers_preferences() {
        assert_eq!(voice_name("american_female"), "en-US-JennyNeural");
        assert_eq!(voice_name("american_male"), "en-US-GuyNeural");
        assert_eq!(voice_name("british_female"), "en-GB-SoniaNeural");
        assert_eq!(voice_name("british_male"), "en-GB-RyanNeural");
        assert_eq!(voice_name("robot"), "en-US-JennyNeural");
    }

    #[test]
    fn feedback_tiers_follow_accuracy() {
        assert!(accuracy_feedback(92.0).starts_with("Excellent"));
        assert!(accuracy_feedback(75.0).starts_with("Good"));
        assert!(accuracy_feedback(55.0).starts_with("Fair"));
        assert!(accuracy_feedback(30.0).starts_with("This sound needs practice"));
    }

    #[test]
    fn ssml_escapes_markup_characters() {
        assert_eq!(escape_ssml("cats & dogs <3"), "cats &amp; dogs &lt;3");
    }

    #[test]
    fn transcription_parses_success_response() {
        let body = json!({
            "RecognitionStatus": "Success",
            "DisplayText": "I think therefore I am.",
            "NBest": [{"Confidence": 0.93}]
        });
        let result = parse_transcription(&body).unwrap();
        assert_eq!(result.text, "I think therefore I am.");
        assert!((result.confidence - 0.93).abs() < 1e-9);
    }

    #[test]
    fn transcription_rejects_no_match() {
        let body = json!({"RecognitionStatus": "NoMatch"});
        assert!(matches!(
            parse_transcription(&body),
            Err(SpeechError::NoSpeechRecognized)
        ));
    }

    #[test]
    fn assessment_parses_word_and_phoneme_detail() {
        let body = json!({
            "RecognitionStatus": "Success",
            "NBest": [{
                "Display": "think",
                "PronunciationAssessment": {
                    "AccuracyScore": 78.0,
                    "FluencyScore": 90.0,
                    "CompletenessScore": 100.0,
                    "PronScore": 82.0
                },
                "Words": [{
                    "Word": "think",
                    "PronunciationAssessment": {"AccuracyScore": 78.0, "ErrorType": "None"},
                    "Phonemes": [
                        {"Phoneme": "th", "PronunciationAssessment": {"AccuracyScore": 55.0}},
                        {"Phoneme": "ih", "PronunciationAssessment": {"AccuracyScore": 95.0}}
                    ]
                }]
            }]
        });
        let result = parse_assessment(&body).unwrap();
        assert_eq!(result.accuracy_score, 78.0);
        assert_eq!(result.words.len(), 1);
        assert_eq!(result.words[0].phonemes[0].phoneme, "th");
        assert_eq!(result.words[0].phonemes[0].accuracy_score, 55.0);
        assert!(result.words[0].error_type.is_none());
        assert!(result.feedback.starts_with("Good"));
    }
}
