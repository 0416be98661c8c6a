//! Camera port - scoped access to a frame source.
//!
//! `CameraDevice::open` acquires the hardware and yields a `CameraStream`.
//! Streams are released explicitly with `release`; the frame sampler wraps
//! them in a guard so every exit path releases the device.

use async_trait::async_trait;

use crate::domain::vision::Frame;

/// Camera permission as last reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPermission {
    Granted,
    Denied,
}

/// Camera failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// The user refused or revoked camera access.
    #[error("camera permission denied")]
    PermissionDenied,

    /// The device could not be opened or was lost.
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// No frame could be read this time; the next read may succeed.
    #[error("frame not ready: {0}")]
    FrameNotReady(String),
}

impl CameraError {
    /// Transient errors skip one tick; everything else ends the session.
    pub fn is_transient(&self) -> bool {
        matches!(self, CameraError::FrameNotReady(_))
    }
}

/// A camera that can be acquired.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Acquire the device. Fails with `PermissionDenied` when access is refused.
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// An acquired camera.
#[async_trait]
pub trait CameraStream: Send {
    /// Current permission; revocation mid-session reports `Denied`.
    fn permission(&self) -> CameraPermission;

    /// Read the current frame.
    async fn grab_frame(&mut self) -> Result<Frame, CameraError>;

    /// Release the device. Must be idempotent.
    fn release(&mut self);
}
