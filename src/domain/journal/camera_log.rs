//! Persisted audit copy of a vision signal.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProfileId, Timestamp};
use crate::domain::vision::{Emotion, SignalMetrics, VisionSignal};

/// A stored camera reading. Always tied to one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraLog {
    pub profile_id: ProfileId,
    pub emotion: Emotion,
    pub confidence: f64,
    pub metrics: SignalMetrics,
    pub captured_at: Timestamp,
}

impl CameraLog {
    /// Audit copy of a signal; `None` when the signal has no profile.
    pub fn from_signal(signal: &VisionSignal) -> Option<Self> {
        let profile_id = signal.profile_id()?;
        Some(Self {
            profile_id,
            emotion: signal.emotion(),
            confidence: signal.confidence(),
            metrics: signal.metrics().clone(),
            captured_at: signal.timestamp(),
        })
    }
}
