//! Vision pipeline configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timing and sampling knobs for the vision pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    /// Spacing between camera samples
    #[serde(default = "default_sample_interval")]
    pub sample_interval_ms: u64,

    /// Minimum spacing between audit writes per profile
    #[serde(default = "default_persist_throttle")]
    pub persist_throttle_ms: u64,

    /// Age after which a live signal is ignored
    #[serde(default = "default_freshness_horizon")]
    pub freshness_horizon_ms: i64,

    /// Pixel stride used by the extractor
    #[serde(default = "default_sample_stride")]
    pub sample_stride: u32,

    /// Run the frame sampler on the scripted demo camera
    #[serde(default)]
    pub demo_camera: bool,
}

impl VisionConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn persist_throttle(&self) -> Duration {
        Duration::from_millis(self.persist_throttle_ms)
    }

    /// Validate vision configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sample_interval_ms == 0 {
            return Err(ValidationError::ZeroVisionSetting("sample_interval_ms"));
        }
        if self.freshness_horizon_ms <= 0 {
            return Err(ValidationError::ZeroVisionSetting("freshness_horizon_ms"));
        }
        if self.sample_stride == 0 {
            return Err(ValidationError::ZeroVisionSetting("sample_stride"));
        }
        Ok(())
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval(),
            persist_throttle_ms: default_persist_throttle(),
            freshness_horizon_ms: default_freshness_horizon(),
            sample_stride: default_sample_stride(),
            demo_camera: false,
        }
    }
}

fn default_sample_interval() -> u64 {
    3_000
}

fn default_persist_throttle() -> u64 {
    10_000
}

fn default_freshness_horizon() -> i64 {
    15_000
}

fn default_sample_stride() -> u32 {
    4
}
