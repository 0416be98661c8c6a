//! HTTP DTOs (Data Transfer Objects) for the Moodlens API.
//!
//! Request bodies keep identifiers as strings so malformed ids surface as
//! validation errors with our own error body instead of extractor rejections.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{ChatOutcome, NoAnswerReason, NO_ANSWER_MESSAGE};
use crate::domain::foundation::{ProfileId, Timestamp};
use crate::domain::journal::{ConsentFlags, MoodEntry, MoodSource, Profile};
use crate::domain::vision::{Emotion, SignalMetrics, VisionSignal};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to log a mood entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LogMoodRequest {
    pub profile_id: String,
    pub mood: String,
    #[serde(default)]
    pub note: Option<String>,
    /// One of manual, demo, sandbox, camera.
    #[serde(default = "default_mood_source")]
    pub source: String,
}

fn default_mood_source() -> String {
    MoodSource::Manual.as_str().to_string()
}

/// A client-side expression reading.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEmotionRequest {
    #[serde(default)]
    pub profile_id: Option<String>,
    pub emotion: String,
    /// Percentage, 0..=100.
    pub confidence: f64,
    pub valence: f64,
    pub energy: f64,
    pub tension: f64,
    pub focus: f64,
    #[serde(default)]
    pub tilt: Option<f64>,
    #[serde(default)]
    pub cues: Vec<String>,
}

/// Query for the live signal lookup. Without a profile the unassociated
/// signal is returned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveSignalQuery {
    #[serde(default)]
    pub profile_id: Option<String>,
}

/// One chat message from the user.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub profile_id: String,
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Response after the onboarding quiz.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileCreatedResponse {
    pub profile_id: ProfileId,
}

/// Full profile view.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
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
    /// ISO 8601.
    pub created_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            nickname: profile.nickname,
            focus_areas: profile.focus_areas,
            consent: profile.consent,
            mood_baseline: profile.mood_baseline,
            mbti: profile.mbti,
            enneagram: profile.enneagram,
            archetype: profile.archetype,
            zodiac: profile.zodiac,
            notes: profile.notes,
            conversation_summary: profile.conversation_summary,
            created_at: profile.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// A stored mood entry.
#[derive(Debug, Clone, Serialize)]
pub struct MoodEntryResponse {
    pub profile_id: ProfileId,
    pub mood: String,
    pub note: Option<String>,
    pub source: MoodSource,
    pub created_at: String,
}

impl From<MoodEntry> for MoodEntryResponse {
    fn from(entry: MoodEntry) -> Self {
        Self {
            profile_id: entry.profile_id(),
            mood: entry.mood().to_string(),
            note: entry.note().map(str::to_string),
            source: entry.source(),
            created_at: entry.created_at().as_datetime().to_rfc3339(),
        }
    }
}

/// The live vision signal.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSignalResponse {
    pub emotion: Emotion,
    pub confidence: f64,
    pub metrics: SignalMetrics,
    pub captured_at: String,
    pub age_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
}

impl LiveSignalResponse {
    pub fn from_signal(signal: &VisionSignal, now: Timestamp) -> Self {
        Self {
            emotion: signal.emotion(),
            confidence: signal.confidence(),
            metrics: signal.metrics().clone(),
            captured_at: signal.timestamp().as_datetime().to_rfc3339(),
            age_ms: signal.age_millis(now),
            profile_id: signal.profile_id(),
        }
    }
}

/// Result of one chat exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// "answered" or "no_answer".
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NoAnswerReason>,
    /// Text to show the user.
    pub message: String,
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        match outcome {
            ChatOutcome::Answered { reply } => Self {
                status: "answered",
                message: reply.clone(),
                reply: Some(reply),
                reason: None,
            },
            ChatOutcome::NoAnswer { reason } => Self {
                status: "no_answer",
                reply: None,
                reason: Some(reason),
                message: NO_ANSWER_MESSAGE.to_string(),
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mood_request_defaults_to_manual_source() {
        let json = r#"{"profile_id": "x", "mood": "tenang"}"#;
        let request: LogMoodRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.source, "manual");
        assert!(request.note.is_none());
    }

    #[test]
    fn emotion_request_optional_fields_default() {
        let json = r#"{"emotion": "happy", "confidence": 90, "valence": 0.5,
                       "energy": 0.6, "tension": 0.1, "focus": 0.7}"#;
        let request: RecordEmotionRequest = serde_json::from_str(json).unwrap();
        assert!(request.profile_id.is_none());
        assert!(request.cues.is_empty());
        assert!(request.tilt.is_none());
    }

    #[test]
    fn answered_chat_response_shape() {
        let response = ChatResponse::from(ChatOutcome::Answered {
            reply: "Aku di sini.".to_string(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "answered");
        assert_eq!(json["reply"], "Aku di sini.");
        assert_eq!(json["message"], "Aku di sini.");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn no_answer_chat_response_shape() {
        let response = ChatResponse::from(ChatOutcome::NoAnswer {
            reason: NoAnswerReason::TimedOut,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "no_answer");
        assert_eq!(json["reason"], "timed_out");
        assert_eq!(json["message"], NO_ANSWER_MESSAGE);
        assert!(json.get("reply").is_none());
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "gone")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }
}
