//! Append-only conversation log entries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ProfileId, Timestamp, ValidationError};

/// Maximum characters accepted in a user turn.
pub const USER_TURN_MAX_CHARS: usize = 2000;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(TurnRole::User),
            "assistant" => Some(TurnRole::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single persisted message, ordered by `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub profile_id: ProfileId,
    pub role: TurnRole,
    pub content: String,
    pub created_at: Timestamp,
}

impl ConversationTurn {
    /// Validates a user message: non-blank and within the length limit.
    pub fn user(profile_id: ProfileId, content: &str) -> Result<Self, ValidationError> {
        let content = validate_user_message(content)?;
        Ok(Self {
            profile_id,
            role: TurnRole::User,
            content,
            created_at: Timestamp::now(),
        })
    }

    /// Wraps an assistant reply.
    pub fn assistant(profile_id: ProfileId, content: impl Into<String>) -> Self {
        Self {
            profile_id,
            role: TurnRole::Assistant,
            content: content.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Overrides the creation time.
    pub fn at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Trims a user message and checks its bounds.
pub fn validate_user_message(content: &str) -> Result<String, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("message"));
    }
    let len = trimmed.chars().count();
    if len > USER_TURN_MAX_CHARS {
        return Err(ValidationError::too_long("message", USER_TURN_MAX_CHARS, len));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_turn_trims_content() {
        let turn = ConversationTurn::user(ProfileId::new(), "  halo  ").unwrap();
        assert_eq!(turn.content, "halo");
        assert_eq!(turn.role, TurnRole::User);
    }

    #[test]
    fn blank_user_turn_is_rejected() {
        assert!(ConversationTurn::user(ProfileId::new(), " \n ").is_err());
    }

    #[test]
    fn oversized_user_turn_is_rejected() {
        let long = "a".repeat(USER_TURN_MAX_CHARS + 1);
        assert!(matches!(
            ConversationTurn::user(ProfileId::new(), &long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn role_parses_round_trip() {
        for role in [TurnRole::User, TurnRole::Assistant] {
            assert_eq!(TurnRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(TurnRole::parse("system"), None);
    }
}
