//! FaceDetector port - opaque face localisation.

use async_trait::async_trait;

use crate::domain::vision::{FaceRegion, Frame};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectorError {
    /// The model could not be loaded or initialised.
    #[error("detector initialisation failed: {0}")]
    Initialisation(String),

    /// Detection failed for this frame.
    #[error("detection failed: {0}")]
    Detection(String),
}

/// Finds at most one face in a frame.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Load models before the first detection.
    async fn warm_up(&self) -> Result<(), DetectorError>;

    /// `Ok(None)` when no face is visible.
    async fn detect_face(&self, frame: &Frame) -> Result<Option<FaceRegion>, DetectorError>;
}
