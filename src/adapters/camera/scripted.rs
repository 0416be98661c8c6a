//! Deterministic camera and face detector.
//!
//! `ScriptedCamera` plays back a fixed list of frames and failures, then
//! keeps returning the last frame. `FixedFaceDetector` always reports the
//! same region. Both are used for demos and tests; hardware capture and the
//! face model live outside this crate.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::vision::{FaceRegion, Frame};
use crate::ports::{
    CameraDevice, CameraError, CameraPermission, CameraStream, DetectorError, FaceDetector,
};

/// One step of a camera script.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Frame(Frame),
    Error(CameraError),
    /// Revoke permission; the read fails with `PermissionDenied`.
    Revoke,
}

#[derive(Debug, Default)]
struct CameraShared {
    script: Mutex<VecDeque<ScriptStep>>,
    last_frame: Mutex<Option<Frame>>,
    revoked: AtomicBool,
    opens: AtomicUsize,
    releases: AtomicUsize,
}

/// Camera that plays back a script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCamera {
    shared: Arc<CameraShared>,
    open_error: Option<CameraError>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera whose open always fails with `error`.
    pub fn refusing(error: CameraError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::default()
        }
    }

    pub fn with_frame(self, frame: Frame) -> Self {
        self.with_step(ScriptStep::Frame(frame))
    }

    pub fn with_step(self, step: ScriptStep) -> Self {
        self.shared
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(step);
        self
    }

    /// Revokes permission for any open stream.
    pub fn revoke_permission(&self) {
        self.shared.revoked.store(true, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.shared.releases.load(Ordering::SeqCst)
    }

    /// True while a stream is open and not yet released.
    pub fn in_use(&self) -> bool {
        self.open_count() > self.release_count()
    }
}

#[async_trait]
impl CameraDevice for ScriptedCamera {
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        if self.shared.revoked.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied);
        }
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedStream {
            shared: Arc::clone(&self.shared),
            released: false,
        }))
    }
}

struct ScriptedStream {
    shared: Arc<CameraShared>,
    released: bool,
}

#[async_trait]
impl CameraStream for ScriptedStream {
    fn permission(&self) -> CameraPermission {
        if self.shared.revoked.load(Ordering::SeqCst) {
            CameraPermission::Denied
        } else {
            CameraPermission::Granted
        }
    }

    async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if self.released {
            return Err(CameraError::Unavailable("stream released".to_string()));
        }
        let step = self
            .shared
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let mut last = self
            .shared
            .last_frame
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match step {
            Some(ScriptStep::Frame(frame)) => {
                *last = Some(frame.clone());
                Ok(frame)
            }
            Some(ScriptStep::Error(err)) => Err(err),
            Some(ScriptStep::Revoke) => {
                self.shared.revoked.store(true, Ordering::SeqCst);
                Err(CameraError::PermissionDenied)
            }
            None => last
                .clone()
                .ok_or_else(|| CameraError::FrameNotReady("no frame scripted".to_string())),
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Detector that always reports the same face, or none.
#[derive(Debug, Default)]
pub struct FixedFaceDetector {
    region: Option<FaceRegion>,
    warm_up_error: Option<String>,
    failures_left: AtomicUsize,
    calls: AtomicUsize,
}

impl FixedFaceDetector {
    pub fn new(region: Option<FaceRegion>) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    /// Detector that never finds a face.
    pub fn no_face() -> Self {
        Self::new(None)
    }

    /// Makes `warm_up` fail.
    pub fn with_warm_up_failure(mut self, message: impl Into<String>) -> Self {
        self.warm_up_error = Some(message.into());
        self
    }

    /// Makes the next `count` detections fail.
    pub fn failing_next(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FaceDetector for FixedFaceDetector {
    async fn warm_up(&self) -> Result<(), DetectorError> {
        match &self.warm_up_error {
            Some(message) => Err(DetectorError::Initialisation(message.clone())),
            None => Ok(()),
        }
    }

    async fn detect_face(&self, _frame: &Frame) -> Result<Option<FaceRegion>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DetectorError::Detection("scripted failure".to_string()));
        }
        Ok(self.region.clone())
    }
}
