//! SubmitQuizHandler - turns onboarding answers into a stored profile.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::foundation::{DomainError, ValidationError};
use crate::domain::journal::{Profile, QuizSubmission};
use crate::ports::ProfileStore;

#[derive(Debug, Clone, Error)]
pub enum SubmitQuizError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store unavailable: {0}")]
    Unavailable(DomainError),
}

pub struct SubmitQuizHandler {
    store: Arc<dyn ProfileStore>,
}

impl SubmitQuizHandler {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, submission: QuizSubmission) -> Result<Profile, SubmitQuizError> {
        let profile = submission.into_profile()?;

        self.store.save_profile(&profile).await.map_err(|e| {
            warn!(error = %e, "profile save failed");
            SubmitQuizError::Unavailable(e)
        })?;

        info!(profile_id = %profile.id, focus_areas = profile.focus_areas.len(), "profile created");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::{InMemoryProfileStore, StoreOperation};

    fn submission() -> QuizSubmission {
        QuizSubmission {
            nickname: "Sekar".to_string(),
            focus_areas: vec!["stress".to_string()],
            mood_baseline: "tenang".to_string(),
            ..QuizSubmission::default()
        }
    }

    #[tokio::test]
    async fn valid_quiz_is_saved() {
        let store = Arc::new(InMemoryProfileStore::new());
        let handler = SubmitQuizHandler::new(store.clone());

        let profile = handler.handle(submission()).await.unwrap();
        let stored = store.profile(profile.id).unwrap();
        assert_eq!(stored.nickname, "Sekar");
        assert!(stored.conversation_summary.is_none());
    }

    #[tokio::test]
    async fn invalid_quiz_touches_nothing() {
        let store = Arc::new(InMemoryProfileStore::new());
        store.fail_on(StoreOperation::SaveProfile);
        let handler = SubmitQuizHandler::new(store);
        let mut bad = submission();
        bad.focus_areas.clear();

        assert!(matches!(
            handler.handle(bad).await,
            Err(SubmitQuizError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn store_failure_is_unavailable() {
        let store = Arc::new(InMemoryProfileStore::new());
        store.fail_on(StoreOperation::SaveProfile);
        let handler = SubmitQuizHandler::new(store);

        assert!(matches!(
            handler.handle(submission()).await,
            Err(SubmitQuizError::Unavailable(_))
        ));
    }
}
