//! Vision module - camera frames reduced to a bounded emotional signal.

mod cache;
mod emotion;
mod extractor;
mod frame;
mod signal;

pub use cache::SignalCache;
pub use emotion::Emotion;
pub use extractor::{
    bucket_for, sample_brightness, BrightnessExtractor, SignalExtractor, DEFAULT_SAMPLE_STRIDE,
    TILT_CUE_DEGREES,
};
pub use frame::{FaceRegion, Frame, BYTES_PER_PIXEL};
pub use signal::{SignalMetrics, VisionSignal, FRESHNESS_HORIZON_MS, MAX_CUES, MAX_CUE_CHARS};
