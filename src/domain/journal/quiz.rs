//! Onboarding quiz answers and their validation into a `Profile`.

use serde::{Deserialize, Serialize};

use super::profile::{ConsentFlags, Profile};
use crate::domain::foundation::{collapse_whitespace, ProfileId, Timestamp, ValidationError};

pub const NICKNAME_MAX_CHARS: usize = 40;
pub const MAX_FOCUS_AREAS: usize = 3;
pub const FOCUS_AREA_MAX_CHARS: usize = 32;
pub const BASELINE_MIN_CHARS: usize = 2;
pub const PROFILE_NOTES_MAX_CHARS: usize = 500;

/// Raw quiz answers as submitted by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub nickname: String,
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub consent: ConsentFlags,
    pub mood_baseline: String,
    #[serde(default)]
    pub mbti: Option<String>,
    #[serde(default)]
    pub enneagram: Option<u8>,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub zodiac: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl QuizSubmission {
    /// Validates every answer and produces a fresh profile with no summary.
    pub fn into_profile(self) -> Result<Profile, ValidationError> {
        let nickname = collapse_whitespace(&self.nickname);
        if nickname.is_empty() {
            return Err(ValidationError::empty_field("nickname"));
        }
        let nickname_len = nickname.chars().count();
        if nickname_len > NICKNAME_MAX_CHARS {
            return Err(ValidationError::too_long(
                "nickname",
                NICKNAME_MAX_CHARS,
                nickname_len,
            ));
        }

        let focus_areas = validate_focus_areas(&self.focus_areas)?;

        let mood_baseline = collapse_whitespace(&self.mood_baseline);
        if mood_baseline.is_empty() {
            return Err(ValidationError::empty_field("mood_baseline"));
        }
        if mood_baseline.chars().count() < BASELINE_MIN_CHARS {
            return Err(ValidationError::invalid_format(
                "mood_baseline",
                format!("must be at least {} characters", BASELINE_MIN_CHARS),
            ));
        }

        let mbti = non_blank(self.mbti).map(|m| validate_mbti(&m)).transpose()?;

        if let Some(e) = self.enneagram {
            if !(1..=9).contains(&e) {
                return Err(ValidationError::out_of_range(
                    "enneagram",
                    1.0,
                    9.0,
                    f64::from(e),
                ));
            }
        }

        let notes = non_blank(self.notes);
        if let Some(n) = &notes {
            let len = n.chars().count();
            if len > PROFILE_NOTES_MAX_CHARS {
                return Err(ValidationError::too_long(
                    "notes",
                    PROFILE_NOTES_MAX_CHARS,
                    len,
                ));
            }
        }

        Ok(Profile {
            id: ProfileId::new(),
            nickname,
            focus_areas,
            consent: self.consent,
            mood_baseline,
            mbti,
            enneagram: self.enneagram,
            archetype: non_blank(self.archetype),
            zodiac: non_blank(self.zodiac),
            notes,
            conversation_summary: None,
            created_at: Timestamp::now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_focus_areas(areas: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut tags: Vec<String> = Vec::with_capacity(areas.len());
    for raw in areas {
        let tag = collapse_whitespace(raw).to_lowercase();
        if tag.is_empty() {
            return Err(ValidationError::empty_field("focus_areas"));
        }
        let len = tag.chars().count();
        if len > FOCUS_AREA_MAX_CHARS {
            return Err(ValidationError::too_long(
                "focus_areas",
                FOCUS_AREA_MAX_CHARS,
                len,
            ));
        }
        if tags.contains(&tag) {
            return Err(ValidationError::invalid_format(
                "focus_areas",
                format!("duplicate tag '{}'", tag),
            ));
        }
        tags.push(tag);
    }

    if tags.is_empty() || tags.len() > MAX_FOCUS_AREAS {
        return Err(ValidationError::out_of_range(
            "focus_areas",
            1.0,
            MAX_FOCUS_AREAS as f64,
            tags.len() as f64,
        ));
    }
    Ok(tags)
}

fn validate_mbti(raw: &str) -> Result<String, ValidationError> {
    const AXES: [[char; 2]; 4] = [['E', 'I'], ['S', 'N'], ['T', 'F'], ['J', 'P']];

    let upper = raw.trim().to_ascii_uppercase();
    let chars: Vec<char> = upper.chars().collect();
    let valid = chars.len() == AXES.len()
        && chars
            .iter()
            .zip(AXES.iter())
            .all(|(c, axis)| axis.contains(c));

    if valid {
        Ok(upper)
    } else {
        Err(ValidationError::invalid_format(
            "mbti",
            format!("'{}' is not a four-letter type", raw.trim()),
        ))
    }
}
