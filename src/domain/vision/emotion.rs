//! Discrete emotion labels produced by the signal extractor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Discrete emotion label, ordered from brightest bucket to darkest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Surprised,
    Neutral,
    Tired,
    Sad,
    Angry,
}

impl Emotion {
    /// All labels, brightest bucket first.
    pub const ALL: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Surprised,
        Emotion::Neutral,
        Emotion::Tired,
        Emotion::Sad,
        Emotion::Angry,
    ];

    /// Lowercase wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
            Emotion::Tired => "tired",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
        }
    }

    /// Position in the brightness ordering; 0 is the brightest bucket.
    pub fn rank(&self) -> usize {
        match self {
            Emotion::Happy => 0,
            Emotion::Surprised => 1,
            Emotion::Neutral => 2,
            Emotion::Tired => 3,
            Emotion::Sad => 4,
            Emotion::Angry => 5,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::invalid_format("emotion", format!("unknown label '{}'", s.trim()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("Happy".parse::<Emotion>().unwrap(), Emotion::Happy);
        assert_eq!(" sad ".parse::<Emotion>().unwrap(), Emotion::Sad);
    }

    #[test]
    fn rejects_unknown_labels() {
        assert!("melancholic".parse::<Emotion>().is_err());
    }

    #[test]
    fn ranks_follow_declaration_order() {
        for (i, emotion) in Emotion::ALL.iter().enumerate() {
            assert_eq!(emotion.rank(), i);
        }
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Emotion::Surprised).unwrap(), "\"surprised\"");
    }
}
