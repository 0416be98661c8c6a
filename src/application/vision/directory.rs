//! Per-profile live signal lookup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{ProfileId, Timestamp};
use crate::domain::vision::{SignalCache, VisionSignal, FRESHNESS_HORIZON_MS};
use crate::ports::SignalSubscriber;

/// Broadcaster subscriber holding one `SignalCache` per profile.
///
/// Signals without a profile only update the unassociated slot.
#[derive(Debug)]
pub struct SignalDirectory {
    caches: RwLock<HashMap<ProfileId, Arc<SignalCache>>>,
    unassociated: SignalCache,
    horizon_ms: i64,
}

impl SignalDirectory {
    pub fn new() -> Self {
        Self::with_horizon(FRESHNESS_HORIZON_MS)
    }

    pub fn with_horizon(horizon_ms: i64) -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            unassociated: SignalCache::with_horizon(horizon_ms),
            horizon_ms,
        }
    }

    /// Fresh signal for the profile, if any.
    pub fn observe(&self, profile_id: ProfileId) -> Option<Arc<VisionSignal>> {
        self.observe_at(profile_id, Timestamp::now())
    }

    pub fn observe_at(&self, profile_id: ProfileId, now: Timestamp) -> Option<Arc<VisionSignal>> {
        self.caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&profile_id)
            .and_then(|cache| cache.observe_at(now))
    }

    /// Fresh signal produced while no profile was active.
    pub fn observe_unassociated(&self) -> Option<Arc<VisionSignal>> {
        self.unassociated.observe()
    }

    fn cache_for(&self, profile_id: ProfileId) -> Arc<SignalCache> {
        if let Some(cache) = self
            .caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&profile_id)
        {
            return Arc::clone(cache);
        }
        let mut caches = self.caches.write().unwrap_or_else(|e| e.into_inner());
        // Profiles with nothing fresh are dropped; a cache still held by a writer stays
        let now = Timestamp::now();
        caches.retain(|_, cache| Arc::strong_count(cache) > 1 || cache.observe_at(now).is_some());
        Arc::clone(
            caches
                .entry(profile_id)
                .or_insert_with(|| Arc::new(SignalCache::with_horizon(self.horizon_ms))),
        )
    }

    #[cfg(test)]
    fn tracked_profiles(&self) -> usize {
        self.caches.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for SignalDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSubscriber for SignalDirectory {
    fn deliver(&self, signal: Arc<VisionSignal>) {
        match signal.profile_id() {
            Some(id) => self.cache_for(id).store(signal),
            None => self.unassociated.store(signal),
        }
    }

    fn name(&self) -> &'static str {
        "signal_directory"
    }
}
