//! Domain models shared by the service crates

pub mod activity;
pub mod grammar;
pub mod pronunciation;
pub mod progress;
pub mod speaking;
pub mod user;
pub mod vocabulary;

use serde::{Deserialize, Serialize};

/// Content difficulty band, shared by words, rules, and topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown difficulty: {}",
                other
            ))),
        }
    }
}

/// Learning pillar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pillar {
    Vocabulary,
    Grammar,
    Pronunciation,
    Speaking,
}

impl Pillar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Vocabulary => "vocabulary",
            Pillar::Grammar => "grammar",
            Pillar::Pronunciation => "pronunciation",
            Pillar::Speaking => "speaking",
        }
    }
}

impl std::fmt::Display for Pillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Pillar {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "vocabulary" => Ok(Pillar::Vocabulary),
            "grammar" => Ok(Pillar::Grammar),
            "pronunciation" => Ok(Pillar::Pronunciation),
            "speaking" => Ok(Pillar::Speaking),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown pillar: {}",
                other
            ))),
        }
    }
}
