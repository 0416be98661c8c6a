//! In-memory profile store.
//!
//! Used when no database is configured and by tests. Individual operations
//! can be switched to fail, and audit writes can be slowed down, so callers'
//! degradation paths can be exercised.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, ProfileId};
use crate::domain::journal::{CameraLog, ConversationTurn, MoodEntry, Profile};
use crate::ports::ProfileStore;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    GetProfile,
    SaveProfile,
    GetLatestMood,
    GetLatestCameraLog,
    RecentTurns,
    AppendTurn,
    UpdateSummary,
    InsertMood,
    InsertCameraLog,
}

#[derive(Default)]
struct StoreState {
    profiles: HashMap<ProfileId, Profile>,
    moods: Vec<MoodEntry>,
    camera_logs: Vec<CameraLog>,
    turns: Vec<ConversationTurn>,
}

/// Process-local `ProfileStore`.
#[derive(Default)]
pub struct InMemoryProfileStore {
    state: RwLock<StoreState>,
    failing: RwLock<HashSet<StoreOperation>>,
    write_delay: Option<Duration>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile.
    pub fn with_profile(self, profile: Profile) -> Self {
        self.write().profiles.insert(profile.id, profile);
        self
    }

    /// Seeds a mood entry.
    pub fn with_mood(self, entry: MoodEntry) -> Self {
        self.write().moods.push(entry);
        self
    }

    /// Seeds a camera log.
    pub fn with_camera_log(self, log: CameraLog) -> Self {
        self.write().camera_logs.push(log);
        self
    }

    /// Seeds a conversation turn.
    pub fn with_turn(self, turn: ConversationTurn) -> Self {
        self.write().turns.push(turn);
        self
    }

    /// Delays every camera log and mood insert by `delay`.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Makes `operation` fail until `recover` is called.
    pub fn fail_on(&self, operation: StoreOperation) {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(operation);
    }

    pub fn recover(&self, operation: StoreOperation) {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&operation);
    }

    // === Inspection ===

    pub fn profile(&self, id: ProfileId) -> Option<Profile> {
        self.read().profiles.get(&id).cloned()
    }

    pub fn mood_entries(&self, profile_id: ProfileId) -> Vec<MoodEntry> {
        self.read()
            .moods
            .iter()
            .filter(|m| m.profile_id() == profile_id)
            .cloned()
            .collect()
    }

    pub fn camera_logs(&self, profile_id: ProfileId) -> Vec<CameraLog> {
        self.read()
            .camera_logs
            .iter()
            .filter(|l| l.profile_id == profile_id)
            .cloned()
            .collect()
    }

    /// All turns for the profile, oldest first.
    pub fn turns(&self, profile_id: ProfileId) -> Vec<ConversationTurn> {
        let mut turns: Vec<ConversationTurn> = self
            .read()
            .turns
            .iter()
            .filter(|t| t.profile_id == profile_id)
            .cloned()
            .collect();
        turns.sort_by_key(|t| t.created_at);
        turns
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self, operation: StoreOperation) -> Result<(), DomainError> {
        let failing = self.failing.read().unwrap_or_else(|e| e.into_inner());
        if failing.contains(&operation) {
            return Err(DomainError::database(format!(
                "simulated failure for {:?}",
                operation
            )));
        }
        Ok(())
    }

    async fn pause_write(&self) {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, DomainError> {
        self.check(StoreOperation::GetProfile)?;
        Ok(self.profile(id))
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), DomainError> {
        self.check(StoreOperation::SaveProfile)?;
        self.write().profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get_latest_mood(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<MoodEntry>, DomainError> {
        self.check(StoreOperation::GetLatestMood)?;
        Ok(self
            .read()
            .moods
            .iter()
            .filter(|m| m.profile_id() == profile_id)
            .max_by_key(|m| m.created_at())
            .cloned())
    }

    async fn get_latest_camera_log(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<CameraLog>, DomainError> {
        self.check(StoreOperation::GetLatestCameraLog)?;
        Ok(self
            .read()
            .camera_logs
            .iter()
            .filter(|l| l.profile_id == profile_id)
            .max_by_key(|l| l.captured_at)
            .cloned())
    }

    async fn recent_conversation_turns(
        &self,
        profile_id: ProfileId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, DomainError> {
        self.check(StoreOperation::RecentTurns)?;
        let turns = self.turns(profile_id);
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.into_iter().skip(skip).collect())
    }

    async fn append_conversation_turn(&self, turn: &ConversationTurn) -> Result<(), DomainError> {
        self.check(StoreOperation::AppendTurn)?;
        self.write().turns.push(turn.clone());
        Ok(())
    }

    async fn update_conversation_summary(
        &self,
        profile_id: ProfileId,
        summary: &str,
    ) -> Result<(), DomainError> {
        self.check(StoreOperation::UpdateSummary)?;
        let mut state = self.write();
        let profile = state.profiles.get_mut(&profile_id).ok_or_else(|| {
            DomainError::new(ErrorCode::ProfileNotFound, "profile not found")
                .with_detail("profile_id", profile_id.to_string())
        })?;
        profile.conversation_summary = Some(summary.to_string());
        Ok(())
    }

    async fn insert_mood_entry(&self, entry: &MoodEntry) -> Result<(), DomainError> {
        self.pause_write().await;
        self.check(StoreOperation::InsertMood)?;
        self.write().moods.push(entry.clone());
        Ok(())
    }

    async fn insert_camera_log(&self, log: &CameraLog) -> Result<(), DomainError> {
        self.pause_write().await;
        self.check(StoreOperation::InsertCameraLog)?;
        self.write().camera_logs.push(log.clone());
        Ok(())
    }
}
