//! LogMoodHandler - validates and stores a mood entry.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::foundation::{DomainError, ProfileId, ValidationError};
use crate::domain::journal::{MoodEntry, MoodSource};
use crate::ports::ProfileStore;

#[derive(Debug, Clone)]
pub struct LogMoodCommand {
    pub profile_id: ProfileId,
    pub mood: String,
    pub note: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, Error)]
pub enum LogMoodError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store unavailable: {0}")]
    Unavailable(DomainError),
}

pub struct LogMoodHandler {
    store: Arc<dyn ProfileStore>,
}

impl LogMoodHandler {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, cmd: LogMoodCommand) -> Result<MoodEntry, LogMoodError> {
        let source: MoodSource = cmd.source.parse()?;
        let entry = MoodEntry::new(cmd.profile_id, &cmd.mood, cmd.note.as_deref(), source)?;

        self.store.insert_mood_entry(&entry).await.map_err(|e| {
            warn!(profile_id = %cmd.profile_id, error = %e, "mood entry write failed");
            LogMoodError::Unavailable(e)
        })?;

        info!(profile_id = %cmd.profile_id, source = %source, "mood logged");
        Ok(entry)
    }
}
