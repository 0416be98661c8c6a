//! Signal broadcaster - fans vision signals out to subscribers and keeps a
//! throttled audit trail in the profile store.
//!
//! `publish` has three independent paths:
//! 1. synchronous delivery to every registered subscriber;
//! 2. an announcement through the relay to other contexts;
//! 3. a best-effort audit write (camera log plus a camera mood entry),
//!    at most once per throttle window per profile.
//!
//! Paths 2 and 3 run on background tasks, so a slow relay or store never
//! holds up the caller. Their failures are logged and dropped. Signals
//! without a profile are never persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::foundation::{Percentage, ProfileId};
use crate::domain::journal::{CameraLog, MoodEntry, MoodSource};
use crate::domain::vision::VisionSignal;
use crate::ports::{ProfileStore, SignalRelay, SignalSubscriber};

/// Default minimum spacing between audit writes for one profile.
pub const DEFAULT_PERSIST_THROTTLE: Duration = Duration::from_millis(10_000);

/// What happened to one published signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// Number of local subscribers that received the signal.
    pub delivered: usize,
    /// Whether an audit write was scheduled for this signal.
    pub persisted: bool,
}

pub struct SignalBroadcaster {
    subscribers: RwLock<Vec<Arc<dyn SignalSubscriber>>>,
    relay: Arc<dyn SignalRelay>,
    store: Arc<dyn ProfileStore>,
    persist_throttle: Duration,
    last_persisted: Mutex<HashMap<ProfileId, Instant>>,
}

impl SignalBroadcaster {
    pub fn new(relay: Arc<dyn SignalRelay>, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            relay,
            store,
            persist_throttle: DEFAULT_PERSIST_THROTTLE,
            last_persisted: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_persist_throttle(mut self, throttle: Duration) -> Self {
        self.persist_throttle = throttle;
        self
    }

    /// Registers a subscriber. It receives signals published from now on.
    pub fn subscribe(&self, subscriber: Arc<dyn SignalSubscriber>) {
        debug!(subscriber = subscriber.name(), "signal subscriber registered");
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Publishes a locally produced signal on all three paths.
    ///
    /// Returns once local delivery is done; the announcement and the audit
    /// write complete in the background.
    pub async fn publish(&self, signal: VisionSignal) -> PublishOutcome {
        let signal = Arc::new(signal);
        let delivered = self.deliver_local(Arc::clone(&signal));

        let relay = Arc::clone(&self.relay);
        let announced = Arc::clone(&signal);
        tokio::spawn(async move {
            if let Err(e) = relay.announce(&announced).await {
                warn!(relay = relay.name(), error = %e, "signal relay announcement failed");
            }
        });

        let due = CameraLog::from_signal(&signal)
            .filter(|log| self.claim_persist_slot(log.profile_id));
        let persisted = due.is_some();
        if let Some(log) = due {
            tokio::spawn(write_audit(Arc::clone(&self.store), log));
        }

        PublishOutcome {
            delivered,
            persisted,
        }
    }

    /// Delivers to local subscribers only. Used for signals arriving from
    /// other contexts, which must not be re-announced or re-persisted.
    pub fn deliver_local(&self, signal: Arc<VisionSignal>) -> usize {
        // Clone the list so no lock is held while subscribers run
        let subscribers: Vec<Arc<dyn SignalSubscriber>> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        for subscriber in &subscribers {
            subscriber.deliver(Arc::clone(&signal));
        }
        subscribers.len()
    }

    /// Claims the throttle slot for a profile. The slot is armed on the
    /// attempt, so a failing store is not retried inside the window.
    /// Expired slots are dropped on every claim.
    fn claim_persist_slot(&self, profile_id: ProfileId) -> bool {
        let now = Instant::now();
        let mut last = self
            .last_persisted
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = last.get(&profile_id) {
            if now.duration_since(*previous) <= self.persist_throttle {
                return false;
            }
        }
        last.retain(|_, at| now.duration_since(*at) <= self.persist_throttle);
        last.insert(profile_id, now);
        true
    }

    #[cfg(test)]
    fn throttled_profiles(&self) -> usize {
        self.last_persisted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Writes the camera log and its camera mood entry.
async fn write_audit(store: Arc<dyn ProfileStore>, log: CameraLog) {
    if let Err(e) = store.insert_camera_log(&log).await {
        warn!(profile_id = %log.profile_id, error = %e, "camera log write failed");
    }

    let note = format!(
        "camera estimate, {} confidence",
        Percentage::from_score(log.confidence)
    );
    match MoodEntry::new(
        log.profile_id,
        log.emotion.as_str(),
        Some(&note),
        MoodSource::Camera,
    ) {
        Ok(entry) => {
            let entry = entry.at(log.captured_at);
            if let Err(e) = store.insert_mood_entry(&entry).await {
                warn!(profile_id = %log.profile_id, error = %e, "camera mood write failed");
            }
        }
        Err(e) => warn!(error = %e, "camera mood entry rejected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::relay::LocalSignalRelay;
    use crate::adapters::store::{InMemoryProfileStore, StoreOperation};
    use crate::domain::foundation::{DomainError, Timestamp};
    use crate::domain::vision::{Emotion, SignalMetrics};
    use async_trait::async_trait;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Arc<VisionSignal>>>,
    }

    impl Recorder {
        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl SignalSubscriber for Recorder {
        fn deliver(&self, signal: Arc<VisionSignal>) {
            self.seen.lock().unwrap().push(signal);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct BrokenRelay;

    #[async_trait]
    impl SignalRelay for BrokenRelay {
        async fn announce(&self, _signal: &VisionSignal) -> Result<(), DomainError> {
            Err(DomainError::new(
                crate::domain::foundation::ErrorCode::CacheError,
                "relay down",
            ))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn signal(profile: Option<ProfileId>) -> VisionSignal {
        VisionSignal::new(
            Emotion::Sad,
            82.0,
            SignalMetrics::new(-0.6, 0.3, 0.7, 0.4),
            Timestamp::now(),
        )
        .with_profile(profile)
    }

    /// Lets the background announcement and audit tasks run.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn setup() -> (SignalBroadcaster, Arc<InMemoryProfileStore>, Arc<Recorder>) {
        let store = Arc::new(InMemoryProfileStore::new());
        let broadcaster = SignalBroadcaster::new(Arc::new(LocalSignalRelay::new()), store.clone());
        let recorder = Arc::new(Recorder::default());
        broadcaster.subscribe(recorder.clone());
        (broadcaster, store, recorder)
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let (broadcaster, _store, first) = setup();
        let second = Arc::new(Recorder::default());
        broadcaster.subscribe(second.clone());

        let outcome = broadcaster.publish(signal(None)).await;
        assert_eq!(outcome.delivered, 2);
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_signals() {
        let (broadcaster, _store, _first) = setup();
        broadcaster.publish(signal(None)).await;

        let late = Arc::new(Recorder::default());
        broadcaster.subscribe(late.clone());
        assert_eq!(late.count(), 0);
    }

    #[tokio::test]
    async fn signal_without_profile_is_not_persisted() {
        let (broadcaster, store, _rec) = setup();
        let id = ProfileId::new();
        let outcome = broadcaster.publish(signal(None)).await;
        assert!(!outcome.persisted);
        assert!(store.camera_logs(id).is_empty());
    }

    #[tokio::test]
    async fn first_signal_writes_camera_log_and_mood() {
        let (broadcaster, store, _rec) = setup();
        let id = ProfileId::new();

        let outcome = broadcaster.publish(signal(Some(id))).await;
        assert!(outcome.persisted);

        settle().await;
        assert_eq!(store.camera_logs(id).len(), 1);
        let moods = store.mood_entries(id);
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].mood(), "sad");
        assert_eq!(moods[0].source(), MoodSource::Camera);
        assert_eq!(moods[0].note(), Some("camera estimate, 82% confidence"));
    }

    #[tokio::test(start_paused = true)]
    async fn writes_are_throttled_per_profile() {
        let (broadcaster, store, recorder) = setup();
        let id = ProfileId::new();
        let other = ProfileId::new();

        assert!(broadcaster.publish(signal(Some(id))).await.persisted);
        tokio::time::advance(Duration::from_millis(3_000)).await;
        assert!(!broadcaster.publish(signal(Some(id))).await.persisted);
        assert!(broadcaster.publish(signal(Some(other))).await.persisted);

        tokio::time::advance(Duration::from_millis(7_000)).await;
        // exactly at the window: not yet exceeded
        assert!(!broadcaster.publish(signal(Some(id))).await.persisted);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(broadcaster.publish(signal(Some(id))).await.persisted);

        settle().await;
        assert_eq!(store.camera_logs(id).len(), 2);
        assert_eq!(recorder.count(), 5);
    }

    #[tokio::test]
    async fn store_failure_does_not_affect_delivery() {
        let (broadcaster, store, recorder) = setup();
        store.fail_on(StoreOperation::InsertCameraLog);
        store.fail_on(StoreOperation::InsertMood);

        let outcome = broadcaster.publish(signal(Some(ProfileId::new()))).await;
        assert_eq!(outcome.delivered, 1);
        assert!(outcome.persisted);
        assert_eq!(recorder.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_still_arms_the_throttle() {
        let (broadcaster, store, _rec) = setup();
        let id = ProfileId::new();
        store.fail_on(StoreOperation::InsertCameraLog);
        broadcaster.publish(signal(Some(id))).await;
        settle().await;

        store.recover(StoreOperation::InsertCameraLog);
        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert!(!broadcaster.publish(signal(Some(id))).await.persisted);
        settle().await;
        assert!(store.camera_logs(id).is_empty());
    }

    #[tokio::test]
    async fn relay_failure_does_not_affect_delivery_or_persistence() {
        let store = Arc::new(InMemoryProfileStore::new());
        let broadcaster = SignalBroadcaster::new(Arc::new(BrokenRelay), store.clone());
        let recorder = Arc::new(Recorder::default());
        broadcaster.subscribe(recorder.clone());
        let id = ProfileId::new();

        let outcome = broadcaster.publish(signal(Some(id))).await;
        assert_eq!(outcome.delivered, 1);
        assert!(outcome.persisted);
        settle().await;
        assert_eq!(store.camera_logs(id).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_returns_before_the_audit_write_completes() {
        let store = Arc::new(InMemoryProfileStore::new().with_write_delay(Duration::from_secs(5)));
        let broadcaster = SignalBroadcaster::new(Arc::new(LocalSignalRelay::new()), store.clone());
        let recorder = Arc::new(Recorder::default());
        broadcaster.subscribe(recorder.clone());
        let id = ProfileId::new();

        let started = Instant::now();
        let outcome = broadcaster.publish(signal(Some(id))).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(outcome.persisted);
        assert_eq!(recorder.count(), 1);
        assert!(store.camera_logs(id).is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(store.camera_logs(id).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_throttle_slots_are_dropped() {
        let (broadcaster, _store, _rec) = setup();
        for _ in 0..3 {
            broadcaster.publish(signal(Some(ProfileId::new()))).await;
        }
        assert_eq!(broadcaster.throttled_profiles(), 3);

        tokio::time::advance(DEFAULT_PERSIST_THROTTLE + Duration::from_millis(1)).await;
        broadcaster.publish(signal(Some(ProfileId::new()))).await;
        assert_eq!(broadcaster.throttled_profiles(), 1);
    }

    #[tokio::test]
    async fn deliver_local_skips_relay_and_store() {
        let (broadcaster, store, recorder) = setup();
        let id = ProfileId::new();
        let delivered = broadcaster.deliver_local(Arc::new(signal(Some(id))));
        assert_eq!(delivered, 1);
        assert_eq!(recorder.count(), 1);
        assert!(store.camera_logs(id).is_empty());
    }
}
