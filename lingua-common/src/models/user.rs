//! User account, profile, and proficiency level

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User proficiency level. Placement past intermediate is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnglishLevel {
    Beginner,
    Intermediate,
}

impl EnglishLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnglishLevel::Beginner => "beginner",
            EnglishLevel::Intermediate => "intermediate",
        }
    }
}

impl std::fmt::Display for EnglishLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EnglishLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "beginner" => Ok(EnglishLevel::Beginner),
            "intermediate" => Ok(EnglishLevel::Intermediate),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown level: {}",
                other
            ))),
        }
    }
}

/// Per-user study preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub learning_goals: Vec<String>,
    pub native_language: String,
    pub preferred_study_time: String,
    /// Daily study goal, 5..=180 minutes
    pub daily_goal_minutes: i64,
    pub notifications_enabled: bool,
    pub voice_preference: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            learning_goals: vec!["general".to_string()],
            native_language: "pt-BR".to_string(),
            preferred_study_time: "evening".to_string(),
            daily_goal_minutes: 30,
            notifications_enabled: true,
            voice_preference: "american_female".to_string(),
        }
    }
}

/// Full user record as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub current_level: EnglishLevel,
    pub profile: UserProfile,

    pub total_study_time_minutes: i64,
    pub current_streak_days: i64,
    pub longest_streak_days: i64,
    pub last_activity_date: Option<DateTime<Utc>>,

    pub initial_assessment_completed: bool,
    pub last_assessment_date: Option<DateTime<Utc>>,
    pub sessions_since_last_assessment: i64,

    /// Pillar scores, 0..=100
    pub vocabulary_score: f64,
    pub grammar_score: f64,
    pub pronunciation_score: f64,
    pub speaking_score: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new beginner-level user record
    pub fn new(email: String, name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            password_hash,
            current_level: EnglishLevel::Beginner,
            profile: UserProfile::default(),
            total_study_time_minutes: 0,
            current_streak_days: 0,
            longest_streak_days: 0,
            last_activity_date: None,
            initial_assessment_completed: false,
            last_assessment_date: None,
            sessions_since_last_assessment: 0,
            vocabulary_score: 0.0,
            grammar_score: 0.0,
            pronunciation_score: 0.0,
            speaking_score: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pillar_score(&self, pillar: super::Pillar) -> f64 {
        match pillar {
            super::Pillar::Vocabulary => self.vocabulary_score,
            super::Pillar::Grammar => self.grammar_score,
            super::Pillar::Pronunciation => self.pronunciation_score,
            super::Pillar::Speaking => self.speaking_score,
        }
    }
}

/// User view returned by the API. Never carries credential material.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub current_level: EnglishLevel,
    pub profile: UserProfile,
    pub total_study_time_minutes: i64,
    pub current_streak_days: i64,
    pub vocabulary_score: f64,
    pub grammar_score: f64,
    pub pronunciation_score: f64,
    pub speaking_score: f64,
    pub initial_assessment_completed: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            current_level: user.current_level,
            profile: user.profile.clone(),
            total_study_time_minutes: user.total_study_time_minutes,
            current_streak_days: user.current_streak_days,
            vocabulary_score: user.vocabulary_score,
            grammar_score: user.grammar_score,
            pronunciation_score: user.pronunciation_score,
            speaking_score: user.speaking_score,
            initial_assessment_completed: user.initial_assessment_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_as_beginner() {
        let user = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        assert_eq!(user.current_level, EnglishLevel::Beginner);
        assert_eq!(user.profile.native_language, "pt-BR");
        assert_eq!(user.profile.daily_goal_minutes, 30);
        assert!(!user.initial_assessment_completed);
    }

    #[test]
    fn response_view_omits_password_hash() {
        let user = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        let response = UserResponse::from(&user);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@example.com");
    }

    #[test]
    fn level_parses_from_stored_text() {
        let level: EnglishLevel = "intermediate".parse().unwrap();
        assert_eq!(level, EnglishLevel::Intermediate);
        assert!("fluent".parse::<EnglishLevel>().is_err());
    }
}
