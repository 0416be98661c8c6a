//! Profile record produced by the onboarding quiz.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProfileId, Timestamp};

/// Consent choices captured during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsentFlags {
    /// User allowed the camera-based expression estimate.
    pub camera: bool,
    /// User allowed mood and conversation journaling.
    pub journaling: bool,
}

/// A user profile. Owned by the profile store; the companion only reads it
/// and rewrites `conversation_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub nickname: String,
    pub focus_areas: Vec<String>,
    pub consent: ConsentFlags,
    pub mood_baseline: String,
    pub mbti: Option<String>,
    pub enneagram: Option<u8>,
    pub archetype: Option<String>,
    pub zodiac: Option<String>,
    pub notes: Option<String>,
    pub conversation_summary: Option<String>,
    pub created_at: Timestamp,
}

impl Profile {
    /// Minimal profile, mostly for tests and demos.
    pub fn new(nickname: impl Into<String>, mood_baseline: impl Into<String>) -> Self {
        Self {
            id: ProfileId::new(),
            nickname: nickname.into(),
            focus_areas: Vec::new(),
            consent: ConsentFlags::default(),
            mood_baseline: mood_baseline.into(),
            mbti: None,
            enneagram: None,
            archetype: None,
            zodiac: None,
            notes: None,
            conversation_summary: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_focus_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.focus_areas = areas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.conversation_summary = Some(summary.into());
        self
    }

    /// The stored summary when it holds any text.
    pub fn summary(&self) -> Option<&str> {
        self.conversation_summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}
