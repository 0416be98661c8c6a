//! Consumer-side holder for the most recent vision signal.

use std::sync::{Arc, RwLock};

use crate::domain::foundation::Timestamp;

use super::{VisionSignal, FRESHNESS_HORIZON_MS};

/// Holds the latest delivered signal and applies the freshness rule on read.
///
/// Writes replace the whole `Arc`, so readers on the chat path never see a
/// partially updated signal.
#[derive(Debug)]
pub struct SignalCache {
    latest: RwLock<Option<Arc<VisionSignal>>>,
    horizon_ms: i64,
}

impl SignalCache {
    pub fn new() -> Self {
        Self::with_horizon(FRESHNESS_HORIZON_MS)
    }

    pub fn with_horizon(horizon_ms: i64) -> Self {
        Self {
            latest: RwLock::new(None),
            horizon_ms,
        }
    }

    /// Replaces the held signal (last write wins).
    pub fn store(&self, signal: Arc<VisionSignal>) {
        let mut slot = self.latest.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(signal);
    }

    /// The held signal if it is still fresh now.
    pub fn observe(&self) -> Option<Arc<VisionSignal>> {
        self.observe_at(Timestamp::now())
    }

    /// The held signal if it is fresh at `now`.
    pub fn observe_at(&self, now: Timestamp) -> Option<Arc<VisionSignal>> {
        let slot = self.latest.read().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|signal| signal.is_fresh_at(now, self.horizon_ms))
            .cloned()
    }

    /// The held signal regardless of age.
    pub fn peek(&self) -> Option<Arc<VisionSignal>> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for SignalCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vision::{Emotion, SignalMetrics};

    fn signal_at(emotion: Emotion, at: Timestamp) -> Arc<VisionSignal> {
        Arc::new(VisionSignal::new(
            emotion,
            70.0,
            SignalMetrics::new(0.0, 0.5, 0.5, 0.5),
            at,
        ))
    }

    #[test]
    fn empty_cache_observes_nothing() {
        assert!(SignalCache::new().observe().is_none());
    }

    #[test]
    fn stale_signal_is_absent() {
        let cache = SignalCache::new();
        let now = Timestamp::now();
        cache.store(signal_at(Emotion::Sad, now.minus_millis(16_000)));
        assert!(cache.observe_at(now).is_none());
        assert!(cache.peek().is_some());
    }

    #[test]
    fn recent_signal_is_present() {
        let cache = SignalCache::new();
        let now = Timestamp::now();
        cache.store(signal_at(Emotion::Sad, now.minus_millis(14_000)));
        assert_eq!(cache.observe_at(now).unwrap().emotion(), Emotion::Sad);
    }

    #[test]
    fn exact_horizon_is_still_live() {
        let cache = SignalCache::new();
        let now = Timestamp::now();
        cache.store(signal_at(Emotion::Tired, now.minus_millis(FRESHNESS_HORIZON_MS)));
        assert!(cache.observe_at(now).is_some());
    }

    #[test]
    fn last_write_wins() {
        let cache = SignalCache::new();
        let now = Timestamp::now();
        cache.store(signal_at(Emotion::Sad, now));
        cache.store(signal_at(Emotion::Happy, now));
        assert_eq!(cache.observe_at(now).unwrap().emotion(), Emotion::Happy);
    }

    #[test]
    fn fresh_write_replaces_stale_one() {
        let cache = SignalCache::new();
        let now = Timestamp::now();
        cache.store(signal_at(Emotion::Angry, now.minus_millis(60_000)));
        assert!(cache.observe_at(now).is_none());
        cache.store(signal_at(Emotion::Neutral, now));
        assert_eq!(cache.observe_at(now).unwrap().emotion(), Emotion::Neutral);
    }
}
