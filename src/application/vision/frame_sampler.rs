//! Frame sampler - the camera loop.
//!
//! Acquires the camera, warms up the detector, then on every tick grabs a
//! frame, locates a face, extracts a signal and publishes it. State changes
//! are published on a `watch` channel:
//!
//! ```text
//! Idle -> Starting -> Running -> Stopped | Denied | Failed
//!                  \-> Denied | Failed
//! ```
//!
//! The camera stream is held by a lease that releases it on drop, so every
//! exit path gives the device back. An in-flight tick is raced against
//! shutdown and abandoned when shutdown wins.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::broadcaster::SignalBroadcaster;
use crate::domain::foundation::{ProfileId, Timestamp};
use crate::domain::vision::SignalExtractor;
use crate::ports::{CameraDevice, CameraError, CameraPermission, CameraStream, FaceDetector};

/// Default spacing between ticks.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(3_000);

/// Longest wait for the face detector before the tick is skipped.
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_millis(1_000);

/// Lifecycle of one sampling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Starting,
    Running,
    /// Shut down on request.
    Stopped,
    /// Camera permission refused or revoked. The user must start a new session.
    Denied,
    /// Camera or detector could not be used.
    Failed(String),
}

impl SamplerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SamplerState::Stopped | SamplerState::Denied | SamplerState::Failed(_)
        )
    }
}

enum Tick {
    Published,
    Skipped,
    Denied,
    Failed(String),
}

/// Releases the camera stream when dropped.
struct CameraLease {
    stream: Box<dyn CameraStream>,
}

impl CameraLease {
    fn new(stream: Box<dyn CameraStream>) -> Self {
        Self { stream }
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.stream.release();
        debug!("camera released");
    }
}

pub struct FrameSampler {
    camera: Arc<dyn CameraDevice>,
    detector: Arc<dyn FaceDetector>,
    extractor: Arc<dyn SignalExtractor>,
    broadcaster: Arc<SignalBroadcaster>,
    interval: Duration,
    detect_timeout: Duration,
    profile_id: Option<ProfileId>,
    state: watch::Sender<SamplerState>,
}

impl FrameSampler {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        detector: Arc<dyn FaceDetector>,
        extractor: Arc<dyn SignalExtractor>,
        broadcaster: Arc<SignalBroadcaster>,
    ) -> Self {
        let (state, _) = watch::channel(SamplerState::Idle);
        Self {
            camera,
            detector,
            extractor,
            broadcaster,
            interval: DEFAULT_SAMPLE_INTERVAL,
            detect_timeout: DEFAULT_DETECT_TIMEOUT,
            profile_id: None,
            state,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_detect_timeout(mut self, timeout: Duration) -> Self {
        self.detect_timeout = timeout;
        self
    }

    /// Tags every produced signal with the active profile.
    pub fn with_profile(mut self, profile_id: Option<ProfileId>) -> Self {
        self.profile_id = profile_id;
        self
    }

    /// Watches state transitions.
    pub fn state(&self) -> watch::Receiver<SamplerState> {
        self.state.subscribe()
    }

    /// Runs the session on a background task.
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<SamplerState> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Runs one session until shutdown or a terminal failure and returns the
    /// terminal state.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SamplerState {
        self.transition(SamplerState::Starting);

        let stream = match self.camera.open().await {
            Ok(stream) => stream,
            Err(CameraError::PermissionDenied) => {
                warn!("camera permission denied");
                return self.finish(SamplerState::Denied);
            }
            Err(e) => {
                warn!(error = %e, "camera acquisition failed");
                return self.finish(SamplerState::Failed(e.to_string()));
            }
        };
        let mut lease = CameraLease::new(stream);

        if let Err(e) = self.detector.warm_up().await {
            warn!(error = %e, "face detector warm-up failed");
            drop(lease);
            return self.finish(SamplerState::Failed(e.to_string()));
        }

        self.transition(SamplerState::Running);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let terminal = loop {
            if *shutdown.borrow() {
                break SamplerState::Stopped;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break SamplerState::Stopped;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            // A stalled collaborator must not keep the camera past shutdown
            let tick = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("in-flight tick abandoned on shutdown");
                        break SamplerState::Stopped;
                    }
                    continue;
                }
                tick = self.tick(&mut lease) => tick,
            };
            match tick {
                Tick::Published | Tick::Skipped => {}
                Tick::Denied => break SamplerState::Denied,
                Tick::Failed(reason) => break SamplerState::Failed(reason),
            }
        };

        drop(lease);
        self.finish(terminal)
    }

    async fn tick(&self, lease: &mut CameraLease) -> Tick {
        if lease.stream.permission() == CameraPermission::Denied {
            warn!("camera permission revoked");
            return Tick::Denied;
        }

        let frame = match lease.stream.grab_frame().await {
            Ok(frame) => frame,
            Err(e) if e.is_transient() => {
                debug!(error = %e, "frame unavailable, skipping tick");
                return Tick::Skipped;
            }
            Err(CameraError::PermissionDenied) => {
                warn!("camera permission revoked");
                return Tick::Denied;
            }
            Err(e) => {
                warn!(error = %e, "camera lost");
                return Tick::Failed(e.to_string());
            }
        };

        // Detector errors skip the tick; only Ok(None) means whole-frame sampling
        let face = match timeout(self.detect_timeout, self.detector.detect_face(&frame)).await {
            Ok(Ok(face)) => face,
            Ok(Err(e)) => {
                warn!(error = %e, "face detection failed, skipping tick");
                return Tick::Skipped;
            }
            Err(_) => {
                warn!(timeout = ?self.detect_timeout, "face detection timed out, skipping tick");
                return Tick::Skipped;
            }
        };

        let signal = self
            .extractor
            .extract(&frame, face.as_ref(), Timestamp::now())
            .with_profile(self.profile_id);
        let outcome = self.broadcaster.publish(signal).await;
        debug!(
            delivered = outcome.delivered,
            persisted = outcome.persisted,
            "vision signal published"
        );
        Tick::Published
    }

    fn transition(&self, state: SamplerState) {
        debug!(state = ?state, "frame sampler state");
        self.state.send_replace(state);
    }

    fn finish(&self, state: SamplerState) -> SamplerState {
        info!(state = ?state, "frame sampler finished");
        self.transition(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::camera::{FixedFaceDetector, ScriptStep, ScriptedCamera};
    use crate::adapters::relay::LocalSignalRelay;
    use crate::adapters::store::InMemoryProfileStore;
    use crate::application::vision::SignalDirectory;
    use crate::domain::vision::{BrightnessExtractor, Emotion, FaceRegion, Frame};
    use crate::ports::DetectorError;
    use async_trait::async_trait;

    /// Detector whose detection never completes.
    struct StalledDetector;

    #[async_trait]
    impl FaceDetector for StalledDetector {
        async fn warm_up(&self) -> Result<(), DetectorError> {
            Ok(())
        }

        async fn detect_face(&self, _frame: &Frame) -> Result<Option<FaceRegion>, DetectorError> {
            std::future::pending().await
        }
    }

    struct Harness {
        camera: ScriptedCamera,
        directory: Arc<SignalDirectory>,
        store: Arc<InMemoryProfileStore>,
        profile_id: ProfileId,
    }

    fn sampler(
        camera: ScriptedCamera,
        detector: impl FaceDetector + 'static,
    ) -> (Arc<FrameSampler>, Harness) {
        sampler_with(camera, detector, DEFAULT_DETECT_TIMEOUT)
    }

    fn sampler_with(
        camera: ScriptedCamera,
        detector: impl FaceDetector + 'static,
        detect_timeout: Duration,
    ) -> (Arc<FrameSampler>, Harness) {
        let store = Arc::new(InMemoryProfileStore::new());
        let broadcaster = Arc::new(SignalBroadcaster::new(
            Arc::new(LocalSignalRelay::new()),
            store.clone(),
        ));
        let directory = Arc::new(SignalDirectory::new());
        broadcaster.subscribe(directory.clone());
        let profile_id = ProfileId::new();

        let sampler = FrameSampler::new(
            Arc::new(camera.clone()),
            Arc::new(detector),
            Arc::new(BrightnessExtractor::default()),
            broadcaster,
        )
        .with_detect_timeout(detect_timeout)
        .with_profile(Some(profile_id));

        (
            Arc::new(sampler),
            Harness {
                camera,
                directory,
                store,
                profile_id,
            },
        )
    }

    fn frame(level: u8) -> Frame {
        Frame::solid(16, 16, [level, level, level]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_each_tick_until_shutdown() {
        let camera = ScriptedCamera::new().with_frame(frame(250));
        let (sampler, h) = sampler(camera, FixedFaceDetector::no_face());
        let (stop, shutdown) = watch::channel(false);
        let handle = sampler.clone().spawn(shutdown);

        tokio::time::sleep(Duration::from_millis(6_500)).await;
        assert_eq!(*sampler.state().borrow(), SamplerState::Running);
        let live = h.directory.observe(h.profile_id).unwrap();
        assert_eq!(live.emotion(), Emotion::Happy);
        assert!(live
            .metrics()
            .cues()
            .contains(&"face not detected".to_string()));

        stop.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), SamplerState::Stopped);
        assert_eq!(h.camera.release_count(), 1);
        assert!(!h.camera.in_use());
        // ticks at 0, 3000 and 6000 ms; only the first is persisted
        assert_eq!(h.store.camera_logs(h.profile_id).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn denied_at_open_is_terminal() {
        let camera = ScriptedCamera::refusing(CameraError::PermissionDenied);
        let (sampler, h) = sampler(camera, FixedFaceDetector::no_face());
        let (_stop, shutdown) = watch::channel(false);

        assert_eq!(sampler.run(shutdown).await, SamplerState::Denied);
        assert_eq!(*sampler.state().borrow(), SamplerState::Denied);
        assert_eq!(h.camera.open_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn revocation_mid_session_stops_and_releases() {
        let camera = ScriptedCamera::new()
            .with_frame(frame(120))
            .with_frame(frame(120))
            .with_step(ScriptStep::Revoke);
        let (sampler, h) = sampler(camera, FixedFaceDetector::no_face());
        let (_stop, shutdown) = watch::channel(false);

        assert_eq!(sampler.run(shutdown).await, SamplerState::Denied);
        assert_eq!(h.camera.release_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detector_warm_up_failure_releases_camera() {
        let camera = ScriptedCamera::new().with_frame(frame(120));
        let detector = FixedFaceDetector::no_face().with_warm_up_failure("model missing");
        let (sampler, h) = sampler(camera, detector);
        let (_stop, shutdown) = watch::channel(false);

        let state = sampler.run(shutdown).await;
        assert!(matches!(state, SamplerState::Failed(_)));
        assert_eq!(h.camera.open_count(), 1);
        assert_eq!(h.camera.release_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detector_errors_and_missing_frames_skip_ticks() {
        let camera = ScriptedCamera::new()
            .with_step(ScriptStep::Error(CameraError::FrameNotReady("warming".into())))
            .with_frame(frame(250));
        let detector = FixedFaceDetector::no_face().failing_next(1);
        let (sampler, h) = sampler(camera, detector);
        let (stop, shutdown) = watch::channel(false);
        let handle = sampler.clone().spawn(shutdown);

        // tick 0: frame not ready; tick 3000: detector fails
        tokio::time::sleep(Duration::from_millis(4_000)).await;
        assert!(h.directory.observe(h.profile_id).is_none());

        // tick 6000: published
        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert!(h.directory.observe(h.profile_id).is_some());

        stop.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), SamplerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn face_region_is_used_when_detected() {
        let mut pixels = vec![10u8; 16 * 16 * 4];
        for y in 4..8 {
            for x in 4..8 {
                let i = ((y * 16 + x) * 4) as usize;
                pixels[i..i + 3].copy_from_slice(&[250, 250, 250]);
            }
        }
        let camera = ScriptedCamera::new().with_frame(Frame::new(16, 16, pixels).unwrap());
        let detector = FixedFaceDetector::new(Some(FaceRegion::new(4, 4, 4, 4)));
        let (sampler, h) = sampler(camera, detector);
        let (stop, shutdown) = watch::channel(false);
        let handle = sampler.clone().spawn(shutdown);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let live = h.directory.observe(h.profile_id).unwrap();
        assert_eq!(live.emotion(), Emotion::Happy);

        stop.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn lost_camera_is_terminal_failure() {
        let camera = ScriptedCamera::new()
            .with_step(ScriptStep::Error(CameraError::Unavailable("unplugged".into())));
        let (sampler, h) = sampler(camera, FixedFaceDetector::no_face());
        let (_stop, shutdown) = watch::channel(false);

        assert!(matches!(sampler.run(shutdown).await, SamplerState::Failed(_)));
        assert!(!h.camera.in_use());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_a_stalled_tick_and_releases_camera() {
        let camera = ScriptedCamera::new().with_frame(frame(120));
        let (sampler, h) = sampler_with(camera, StalledDetector, Duration::from_secs(3_600));
        let (stop, shutdown) = watch::channel(false);
        let handle = sampler.clone().spawn(shutdown);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(h.camera.in_use());

        stop.send(true).unwrap();
        let state = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sampler should stop while a tick is stalled")
            .unwrap();
        assert_eq!(state, SamplerState::Stopped);
        assert_eq!(h.camera.release_count(), 1);
        assert!(!h.camera.in_use());
        assert!(h.directory.observe(h.profile_id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_detection_times_out_and_skips_the_tick() {
        let camera = ScriptedCamera::new().with_frame(frame(120));
        let (sampler, h) = sampler(camera, StalledDetector);
        let (stop, shutdown) = watch::channel(false);
        let handle = sampler.clone().spawn(shutdown);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(*sampler.state().borrow(), SamplerState::Running);
        assert!(h.directory.observe(h.profile_id).is_none());

        stop.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), SamplerState::Stopped);
        assert_eq!(h.camera.release_count(), 1);
    }

    #[test]
    fn terminal_states() {
        assert!(SamplerState::Stopped.is_terminal());
        assert!(SamplerState::Denied.is_terminal());
        assert!(SamplerState::Failed("x".into()).is_terminal());
        assert!(!SamplerState::Running.is_terminal());
        assert!(!SamplerState::Idle.is_terminal());
    }
}
