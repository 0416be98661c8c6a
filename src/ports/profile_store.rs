//! ProfileStore port - record store behind profiles, moods, camera logs and
//! the conversation log.
//!
//! Every call may fail with a storage error. Callers decide whether a failure
//! is fatal: reads needed to build chat context surface to the user, audit
//! writes are logged and dropped.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProfileId};
use crate::domain::journal::{CameraLog, ConversationTurn, MoodEntry, Profile};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Find a profile by id.
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, DomainError>;

    /// Insert or replace a profile.
    async fn save_profile(&self, profile: &Profile) -> Result<(), DomainError>;

    /// Most recent mood entry for the profile.
    async fn get_latest_mood(&self, profile_id: ProfileId)
        -> Result<Option<MoodEntry>, DomainError>;

    /// Most recent camera log for the profile.
    async fn get_latest_camera_log(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<CameraLog>, DomainError>;

    /// The newest `limit` turns, returned oldest first.
    async fn recent_conversation_turns(
        &self,
        profile_id: ProfileId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, DomainError>;

    /// Append one turn to the conversation log.
    async fn append_conversation_turn(&self, turn: &ConversationTurn) -> Result<(), DomainError>;

    /// Replace the stored rolling summary.
    async fn update_conversation_summary(
        &self,
        profile_id: ProfileId,
        summary: &str,
    ) -> Result<(), DomainError>;

    /// Store a mood entry.
    async fn insert_mood_entry(&self, entry: &MoodEntry) -> Result<(), DomainError>;

    /// Store a camera log.
    async fn insert_camera_log(&self, log: &CameraLog) -> Result<(), DomainError>;
}
