//! RecordEmotionHandler - accepts a client-side expression reading and
//! publishes it through the signal broadcaster.

use std::sync::Arc;

use thiserror::Error;

use crate::application::vision::{PublishOutcome, SignalBroadcaster};
use crate::domain::foundation::{ProfileId, Timestamp, ValidationError};
use crate::domain::vision::{Emotion, SignalMetrics, VisionSignal};

/// A reading as reported by a client.
#[derive(Debug, Clone)]
pub struct RecordEmotionCommand {
    pub profile_id: Option<ProfileId>,
    pub emotion: String,
    pub confidence: f64,
    pub valence: f64,
    pub energy: f64,
    pub tension: f64,
    pub focus: f64,
    pub tilt: Option<f64>,
    pub cues: Vec<String>,
}

#[derive(Debug, Clone, Error)]
pub enum RecordEmotionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub struct RecordEmotionHandler {
    broadcaster: Arc<SignalBroadcaster>,
}

impl RecordEmotionHandler {
    pub fn new(broadcaster: Arc<SignalBroadcaster>) -> Self {
        Self { broadcaster }
    }

    pub async fn handle(
        &self,
        cmd: RecordEmotionCommand,
    ) -> Result<PublishOutcome, RecordEmotionError> {
        let signal = build_signal(cmd, Timestamp::now())?;
        Ok(self.broadcaster.publish(signal).await)
    }
}

/// Validates a reading and stamps it with the server clock.
fn build_signal(cmd: RecordEmotionCommand, at: Timestamp) -> Result<VisionSignal, ValidationError> {
    let emotion: Emotion = cmd.emotion.parse()?;

    if !cmd.confidence.is_finite() || !(0.0..=100.0).contains(&cmd.confidence) {
        return Err(ValidationError::out_of_range(
            "confidence",
            0.0,
            100.0,
            cmd.confidence,
        ));
    }
    if let Some(tilt) = cmd.tilt {
        if !tilt.is_finite() || !(-90.0..=90.0).contains(&tilt) {
            return Err(ValidationError::out_of_range("tilt", -90.0, 90.0, tilt));
        }
    }

    let metrics = SignalMetrics::try_new(cmd.valence, cmd.energy, cmd.tension, cmd.focus)?
        .with_tilt(cmd.tilt)
        .with_cues(cmd.cues);

    Ok(VisionSignal::new(emotion, cmd.confidence, metrics, at).with_profile(cmd.profile_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::relay::LocalSignalRelay;
    use crate::adapters::store::InMemoryProfileStore;
    use crate::application::vision::SignalDirectory;

    fn command(profile_id: Option<ProfileId>) -> RecordEmotionCommand {
        RecordEmotionCommand {
            profile_id,
            emotion: "Sad".to_string(),
            confidence: 82.0,
            valence: -0.6,
            energy: 0.3,
            tension: 0.7,
            focus: 0.4,
            tilt: None,
            cues: vec!["frown".to_string()],
        }
    }

    fn setup() -> (RecordEmotionHandler, Arc<SignalDirectory>, Arc<InMemoryProfileStore>) {
        let store = Arc::new(InMemoryProfileStore::new());
        let broadcaster = Arc::new(SignalBroadcaster::new(
            Arc::new(LocalSignalRelay::new()),
            store.clone(),
        ));
        let directory = Arc::new(SignalDirectory::new());
        broadcaster.subscribe(directory.clone());
        (RecordEmotionHandler::new(broadcaster), directory, store)
    }

    #[tokio::test]
    async fn valid_reading_is_published_and_persisted() {
        let (handler, directory, store) = setup();
        let id = ProfileId::new();

        let outcome = handler.handle(command(Some(id))).await.unwrap();
        assert_eq!(outcome.delivered, 1);
        assert!(outcome.persisted);

        let live = directory.observe(id).unwrap();
        assert_eq!(live.emotion(), Emotion::Sad);
        assert_eq!(live.metrics().cues(), &["frown".to_string()]);

        // the audit write runs in the background
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(store.camera_logs(id).len(), 1);
    }

    #[tokio::test]
    async fn unknown_emotion_is_rejected() {
        let (handler, _directory, store) = setup();
        let id = ProfileId::new();
        let mut cmd = command(Some(id));
        cmd.emotion = "bored".to_string();

        assert!(handler.handle(cmd).await.is_err());
        assert!(store.camera_logs(id).is_empty());
    }

    #[tokio::test]
    async fn out_of_range_values_are_rejected() {
        let (handler, _d, _s) = setup();

        let mut cmd = command(None);
        cmd.confidence = 120.0;
        assert!(handler.handle(cmd).await.is_err());

        let mut cmd = command(None);
        cmd.valence = -1.5;
        assert!(handler.handle(cmd).await.is_err());

        let mut cmd = command(None);
        cmd.energy = f64::NAN;
        assert!(handler.handle(cmd).await.is_err());

        let mut cmd = command(None);
        cmd.tilt = Some(120.0);
        assert!(handler.handle(cmd).await.is_err());
    }

    #[test]
    fn signal_is_stamped_with_server_time() {
        let at = Timestamp::now();
        let signal = build_signal(command(None), at).unwrap();
        assert_eq!(signal.timestamp(), at);
        assert_eq!(signal.profile_id(), None);
    }
}
