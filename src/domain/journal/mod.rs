//! Journal module - profiles, mood entries, camera logs and conversation turns.

mod camera_log;
mod conversation;
mod mood_entry;
mod profile;
mod quiz;

pub use camera_log::CameraLog;
pub use conversation::{validate_user_message, ConversationTurn, TurnRole, USER_TURN_MAX_CHARS};
pub use mood_entry::{MoodEntry, MoodSource, MOOD_MAX_CHARS, MOOD_MIN_CHARS, NOTE_MAX_CHARS};
pub use profile::{ConsentFlags, Profile};
pub use quiz::{
    QuizSubmission, BASELINE_MIN_CHARS, FOCUS_AREA_MAX_CHARS, MAX_FOCUS_AREAS,
    NICKNAME_MAX_CHARS, PROFILE_NOTES_MAX_CHARS,
};
