//! Mood journal entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{collapse_whitespace, ProfileId, Timestamp, ValidationError};

/// Minimum characters in a mood after trimming.
pub const MOOD_MIN_CHARS: usize = 2;

/// Maximum characters in a mood label.
pub const MOOD_MAX_CHARS: usize = 80;

/// Maximum characters in an optional note.
pub const NOTE_MAX_CHARS: usize = 360;

/// Where a mood entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodSource {
    Manual,
    Demo,
    Sandbox,
    Camera,
}

impl MoodSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodSource::Manual => "manual",
            MoodSource::Demo => "demo",
            MoodSource::Sandbox => "sandbox",
            MoodSource::Camera => "camera",
        }
    }
}

impl fmt::Display for MoodSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(MoodSource::Manual),
            "demo" => Ok(MoodSource::Demo),
            "sandbox" => Ok(MoodSource::Sandbox),
            "camera" => Ok(MoodSource::Camera),
            other => Err(ValidationError::invalid_format(
                "source",
                format!("unknown source '{}'", other),
            )),
        }
    }
}

/// A logged mood. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    profile_id: ProfileId,
    mood: String,
    note: Option<String>,
    source: MoodSource,
    created_at: Timestamp,
}

impl MoodEntry {
    /// Validates and builds a new entry stamped with the current time.
    pub fn new(
        profile_id: ProfileId,
        mood: &str,
        note: Option<&str>,
        source: MoodSource,
    ) -> Result<Self, ValidationError> {
        let mood = collapse_whitespace(mood);
        let mood_len = mood.chars().count();
        if mood_len == 0 {
            return Err(ValidationError::empty_field("mood"));
        }
        if mood_len < MOOD_MIN_CHARS {
            return Err(ValidationError::invalid_format(
                "mood",
                format!("must be at least {} characters", MOOD_MIN_CHARS),
            ));
        }
        if mood_len > MOOD_MAX_CHARS {
            return Err(ValidationError::too_long("mood", MOOD_MAX_CHARS, mood_len));
        }

        let note = note.map(str::trim).filter(|n| !n.is_empty());
        if let Some(n) = note {
            let len = n.chars().count();
            if len > NOTE_MAX_CHARS {
                return Err(ValidationError::too_long("note", NOTE_MAX_CHARS, len));
            }
        }

        Ok(Self {
            profile_id,
            mood,
            note: note.map(str::to_string),
            source,
            created_at: Timestamp::now(),
        })
    }

    /// Rebuilds an entry loaded from storage.
    pub fn reconstitute(
        profile_id: ProfileId,
        mood: String,
        note: Option<String>,
        source: MoodSource,
        created_at: Timestamp,
    ) -> Self {
        Self {
            profile_id,
            mood,
            note,
            source,
            created_at,
        }
    }

    /// Overrides the creation time.
    pub fn at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    pub fn mood(&self) -> &str {
        &self.mood
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn source(&self) -> MoodSource {
        self.source
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_is_trimmed_and_collapsed() {
        let entry = MoodEntry::new(ProfileId::new(), "  sangat   cemas ", None, MoodSource::Manual)
            .unwrap();
        assert_eq!(entry.mood(), "sangat cemas");
    }

    #[test]
    fn blank_mood_is_rejected() {
        let err = MoodEntry::new(ProfileId::new(), "   ", None, MoodSource::Demo).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("mood"));
    }

    #[test]
    fn single_character_mood_is_rejected() {
        assert!(MoodEntry::new(ProfileId::new(), " a ", None, MoodSource::Demo).is_err());
        assert!(MoodEntry::new(ProfileId::new(), "ok", None, MoodSource::Demo).is_ok());
    }

    #[test]
    fn note_limit_is_enforced() {
        let long = "n".repeat(NOTE_MAX_CHARS + 1);
        assert!(MoodEntry::new(ProfileId::new(), "lelah", Some(&long), MoodSource::Demo).is_err());

        let max = "n".repeat(NOTE_MAX_CHARS);
        assert!(MoodEntry::new(ProfileId::new(), "lelah", Some(&max), MoodSource::Demo).is_ok());
    }

    #[test]
    fn blank_note_becomes_none() {
        let entry = MoodEntry::new(ProfileId::new(), "lelah", Some("  "), MoodSource::Demo).unwrap();
        assert!(entry.note().is_none());
    }

    #[test]
    fn source_parses_known_tags() {
        assert_eq!("Camera".parse::<MoodSource>().unwrap(), MoodSource::Camera);
        assert!("webcam".parse::<MoodSource>().is_err());
    }
}
