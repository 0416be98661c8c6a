//! Reduces a camera frame to a vision signal.
//!
//! `BrightnessExtractor` is a placeholder oracle: it averages RGB brightness
//! over the face region (or the whole frame when no face was found) and maps
//! the scalar onto six fixed buckets. Callers depend only on the
//! [`SignalExtractor`] trait so a trained classifier can replace it.

use crate::domain::foundation::Timestamp;

use super::{Emotion, FaceRegion, Frame, SignalMetrics, VisionSignal};

/// Default pixel stride used when sampling a region.
pub const DEFAULT_SAMPLE_STRIDE: u32 = 4;

/// Absolute head roll, in degrees, beyond which a tilt cue is emitted.
pub const TILT_CUE_DEGREES: f64 = 12.0;

/// Lower bounds of each bucket, brightest first. Anything below the last
/// bound is `Angry`.
const BUCKET_FLOORS: [(f64, Emotion); 5] = [
    (170.0, Emotion::Happy),
    (140.0, Emotion::Surprised),
    (110.0, Emotion::Neutral),
    (80.0, Emotion::Tired),
    (50.0, Emotion::Sad),
];

/// Produces a vision signal from a frame and an optional face region.
pub trait SignalExtractor: Send + Sync {
    /// Pure with respect to its inputs; `at` becomes the signal timestamp.
    fn extract(&self, frame: &Frame, face: Option<&FaceRegion>, at: Timestamp) -> VisionSignal;
}

/// Maps a brightness scalar onto an emotion bucket.
///
/// Total over every `f64`: NaN and negative values fall into the darkest
/// bucket, and higher brightness never maps to a darker bucket.
pub fn bucket_for(brightness: f64) -> Emotion {
    BUCKET_FLOORS
        .iter()
        .find(|(floor, _)| brightness >= *floor)
        .map(|(_, emotion)| *emotion)
        .unwrap_or(Emotion::Angry)
}

/// Mean of the R, G and B channels over every `stride`-th pixel in both axes.
pub fn sample_brightness(frame: &Frame, region: &FaceRegion, stride: u32) -> f64 {
    let stride = stride.max(1) as usize;
    let mut total = 0u64;
    let mut samples = 0u64;

    for y in (region.y..region.y + region.height).step_by(stride) {
        for x in (region.x..region.x + region.width).step_by(stride) {
            let [r, g, b] = frame.rgb_at(x, y);
            total += u64::from(r) + u64::from(g) + u64::from(b);
            samples += 1;
        }
    }

    if samples == 0 {
        return 0.0;
    }
    total as f64 / (samples as f64 * 3.0)
}

/// Brightness-bucketing extractor.
#[derive(Debug, Clone)]
pub struct BrightnessExtractor {
    stride: u32,
}

impl BrightnessExtractor {
    pub fn new(stride: u32) -> Self {
        Self {
            stride: stride.max(1),
        }
    }

    fn base_valence(emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Happy => 0.7,
            Emotion::Surprised => 0.35,
            Emotion::Neutral => 0.0,
            Emotion::Tired => -0.25,
            Emotion::Sad => -0.6,
            Emotion::Angry => -0.75,
        }
    }

    fn base_tension(emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Happy => 0.2,
            Emotion::Surprised => 0.55,
            Emotion::Neutral => 0.3,
            Emotion::Tired => 0.35,
            Emotion::Sad => 0.6,
            Emotion::Angry => 0.85,
        }
    }

    fn expression_cue(emotion: Emotion) -> &'static str {
        match emotion {
            Emotion::Happy => "smile",
            Emotion::Surprised => "raised brows",
            Emotion::Neutral => "relaxed face",
            Emotion::Tired => "heavy eyelids",
            Emotion::Sad => "frown",
            Emotion::Angry => "furrowed brow",
        }
    }

    fn focus_for(frame: &Frame, face: Option<&FaceRegion>) -> f64 {
        match face {
            Some(region) => {
                let frame_area = u64::from(frame.width()) * u64::from(frame.height());
                let coverage = region.area() as f64 / frame_area as f64;
                0.3 + 0.7 * (coverage * 4.0).min(1.0)
            }
            None => 0.2,
        }
    }
}

impl Default for BrightnessExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_STRIDE)
    }
}

impl SignalExtractor for BrightnessExtractor {
    fn extract(&self, frame: &Frame, face: Option<&FaceRegion>, at: Timestamp) -> VisionSignal {
        let face = face.and_then(|region| frame.clip(region));
        let region = face.clone().unwrap_or_else(|| frame.full_region());

        let brightness = sample_brightness(frame, &region, self.stride);
        let normalized = (brightness / 255.0).clamp(0.0, 1.0);
        let emotion = bucket_for(brightness);

        let tilt = face.as_ref().and_then(|f| f.roll_degrees);
        let mut cues = vec![Self::expression_cue(emotion).to_string()];
        match tilt {
            Some(t) if t >= TILT_CUE_DEGREES => cues.push("head tilted right".to_string()),
            Some(t) if t <= -TILT_CUE_DEGREES => cues.push("head tilted left".to_string()),
            _ => {}
        }
        if face.is_none() {
            cues.push("face not detected".to_string());
        }

        let metrics = SignalMetrics::new(
            Self::base_valence(emotion),
            normalized,
            Self::base_tension(emotion),
            Self::focus_for(frame, face.as_ref()),
        )
        .with_tilt(tilt)
        .with_cues(cues);

        VisionSignal::new(emotion, normalized * 100.0, metrics, at)
    }
}
