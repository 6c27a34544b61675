//! Service configuration loading
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (handled by the service binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! The config file is searched at the OS config location
//! (`~/.config/lingua/config.toml` on Linux, then `/etc/lingua/config.toml`).

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Azure OpenAI chat completion settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// In-process request quota (requests per hour)
    pub requests_per_hour: u32,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: "gpt-4".to_string(),
            api_version: "2024-02-15-preview".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            requests_per_hour: 100,
        }
    }
}

/// Azure Speech service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub api_key: String,
    pub region: String,
    pub default_voice: String,
    pub language: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            region: "eastus".to_string(),
            default_voice: "american_female".to_string(),
            language: "en-US".to_string(),
        }
    }
}

/// Full service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Access token lifetime in hours
    pub token_lifetime_hours: i64,
    pub openai: OpenAiSettings,
    pub speech: SpeechSettings,
    /// Overall score required to move beginner -> intermediate
    pub intermediate_upgrade_threshold: f64,
    /// Sessions between automatic continuous assessments
    pub continuous_assessment_frequency: i64,
    /// Per-user API request quota (requests per minute)
    pub api_rate_limit_per_minute: u32,
    /// Largest accepted audio payload in bytes
    pub max_audio_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            token_lifetime_hours: 24,
            openai: OpenAiSettings::default(),
            speech: SpeechSettings::default(),
            intermediate_upgrade_threshold: 85.0,
            continuous_assessment_frequency: 5,
            api_rate_limit_per_minute: 60,
            max_audio_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Load settings from an explicit file, the default locations, or defaults,
/// then apply environment variable overrides.
pub fn load_settings(config_file: Option<&Path>) -> Result<Settings> {
    let mut settings = match locate_config_file(config_file) {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?
        }
        None => Settings::default(),
    };

    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("lingua").join("config.toml")) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/lingua/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(secret) = std::env::var("LINGUA_JWT_SECRET") {
        settings.jwt_secret = secret;
    }
    if let Ok(endpoint) = std::env::var("AZURE_OPENAI_ENDPOINT") {
        settings.openai.endpoint = endpoint;
    }
    if let Ok(key) = std::env::var("AZURE_OPENAI_KEY") {
        settings.openai.api_key = key;
    }
    if let Ok(deployment) = std::env::var("AZURE_OPENAI_DEPLOYMENT") {
        settings.openai.deployment = deployment;
    }
    if let Ok(key) = std::env::var("AZURE_SPEECH_KEY") {
        settings.speech.api_key = key;
    }
    if let Ok(region) = std::env::var("AZURE_SPEECH_REGION") {
        settings.speech.region = region;
    }
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lingua").join("lingua.db"))
        .unwrap_or_else(|| PathBuf::from("./lingua.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.token_lifetime_hours, 24);
        assert_eq!(settings.openai.deployment, "gpt-4");
        assert_eq!(settings.speech.language, "en-US");
        assert_eq!(settings.intermediate_upgrade_threshold, 85.0);
        assert_eq!(settings.max_audio_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let parsed: Settings = toml::from_str(
            r#"
            jwt_secret = "file-secret"

            [speech]
            region = "westeurope"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.jwt_secret, "file-secret");
        assert_eq!(parsed.speech.region, "westeurope");
        assert_eq!(parsed.openai.max_tokens, 1000);
    }

    #[test]
    #[serial]
    fn env_overrides_take_precedence() {
        std::env::set_var("LINGUA_JWT_SECRET", "env-secret");
        std::env::set_var("AZURE_SPEECH_REGION", "brazilsouth");

        let mut settings = Settings::default();
        apply_env_overrides(&mut settings);

        assert_eq!(settings.jwt_secret, "env-secret");
        assert_eq!(settings.speech.region, "brazilsouth");

        std::env::remove_var("LINGUA_JWT_SECRET");
        std::env::remove_var("AZURE_SPEECH_REGION");
    }
}
