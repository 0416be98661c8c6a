//! The vision signal: an emotion label plus a bounded metric vector.
//!
//! Signals are immutable once built. Every bounded field is clamped on
//! construction, including when a signal is deserialized from a relay or a
//! client payload, so no consumer ever observes an out-of-range value.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProfileId, Timestamp, ValidationError};

use super::Emotion;

/// Age after which a signal is no longer considered live.
pub const FRESHNESS_HORIZON_MS: i64 = 15_000;

/// Maximum number of cues carried by a signal.
pub const MAX_CUES: usize = 8;

/// Maximum length of a single cue.
pub const MAX_CUE_CHARS: usize = 48;

/// Continuous metrics attached to a vision signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMetrics")]
pub struct SignalMetrics {
    valence: f64,
    energy: f64,
    tension: f64,
    focus: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tilt: Option<f64>,
    cues: Vec<String>,
}

#[derive(Deserialize)]
struct RawMetrics {
    valence: f64,
    energy: f64,
    tension: f64,
    focus: f64,
    #[serde(default)]
    tilt: Option<f64>,
    #[serde(default)]
    cues: Vec<String>,
}

impl From<RawMetrics> for SignalMetrics {
    fn from(raw: RawMetrics) -> Self {
        SignalMetrics::new(raw.valence, raw.energy, raw.tension, raw.focus)
            .with_tilt(raw.tilt)
            .with_cues(raw.cues)
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

impl SignalMetrics {
    /// Builds clamped metrics: valence to [-1, 1], the rest to [0, 1].
    pub fn new(valence: f64, energy: f64, tension: f64, focus: f64) -> Self {
        Self {
            valence: clamp_or(valence, -1.0, 1.0, 0.0),
            energy: clamp_or(energy, 0.0, 1.0, 0.0),
            tension: clamp_or(tension, 0.0, 1.0, 0.0),
            focus: clamp_or(focus, 0.0, 1.0, 0.0),
            tilt: None,
            cues: Vec::new(),
        }
    }

    /// Validating constructor for externally supplied readings.
    pub fn try_new(
        valence: f64,
        energy: f64,
        tension: f64,
        focus: f64,
    ) -> Result<Self, ValidationError> {
        check_range("valence", valence, -1.0, 1.0)?;
        check_range("energy", energy, 0.0, 1.0)?;
        check_range("tension", tension, 0.0, 1.0)?;
        check_range("focus", focus, 0.0, 1.0)?;
        Ok(Self::new(valence, energy, tension, focus))
    }

    /// Sets head tilt in degrees. Non-finite values are dropped.
    pub fn with_tilt(mut self, tilt: Option<f64>) -> Self {
        self.tilt = tilt.filter(|t| t.is_finite()).map(|t| t.clamp(-90.0, 90.0));
        self
    }

    /// Sets cues, dropping blanks and bounding count and length.
    pub fn with_cues<I, S>(mut self, cues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cues = cues
            .into_iter()
            .map(|c| c.into().trim().chars().take(MAX_CUE_CHARS).collect::<String>())
            .filter(|c| !c.is_empty())
            .take(MAX_CUES)
            .collect();
        self
    }

    pub fn valence(&self) -> f64 {
        self.valence
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    pub fn focus(&self) -> f64 {
        self.focus
    }

    pub fn tilt(&self) -> Option<f64> {
        self.tilt
    }

    pub fn cues(&self) -> &[String] {
        &self.cues
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_nan() || value < min || value > max {
        return Err(ValidationError::out_of_range(field, min, max, value));
    }
    Ok(())
}

/// An emotional-state reading derived from one camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSignal")]
pub struct VisionSignal {
    emotion: Emotion,
    confidence: f64,
    metrics: SignalMetrics,
    timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_id: Option<ProfileId>,
}

#[derive(Deserialize)]
struct RawSignal {
    emotion: Emotion,
    confidence: f64,
    metrics: SignalMetrics,
    timestamp: Timestamp,
    #[serde(default)]
    profile_id: Option<ProfileId>,
}

impl From<RawSignal> for VisionSignal {
    fn from(raw: RawSignal) -> Self {
        VisionSignal::new(raw.emotion, raw.confidence, raw.metrics, raw.timestamp)
            .with_profile(raw.profile_id)
    }
}

impl VisionSignal {
    /// Builds a signal, clamping confidence to [0, 100].
    pub fn new(
        emotion: Emotion,
        confidence: f64,
        metrics: SignalMetrics,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            emotion,
            confidence: clamp_or(confidence, 0.0, 100.0, 0.0),
            metrics,
            timestamp,
            profile_id: None,
        }
    }

    /// Associates the signal with a profile.
    pub fn with_profile(mut self, profile_id: Option<ProfileId>) -> Self {
        self.profile_id = profile_id;
        self
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn metrics(&self) -> &SignalMetrics {
        &self.metrics
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    /// Milliseconds elapsed between creation and `now`.
    pub fn age_millis(&self, now: Timestamp) -> i64 {
        now.millis_since(&self.timestamp)
    }

    /// True while the signal is within the freshness horizon.
    ///
    /// A signal exactly at the horizon is still live.
    pub fn is_fresh_at(&self, now: Timestamp, horizon_ms: i64) -> bool {
        self.age_millis(now) <= horizon_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn metrics_are_clamped_on_construction() {
        let m = SignalMetrics::new(-3.0, 1.4, -0.2, f64::NAN);
        assert_eq!(m.valence(), -1.0);
        assert_eq!(m.energy(), 1.0);
        assert_eq!(m.tension(), 0.0);
        assert_eq!(m.focus(), 0.0);
    }

    #[test]
    fn try_new_rejects_out_of_range() {
        assert!(SignalMetrics::try_new(0.0, 0.5, 0.5, 0.5).is_ok());
        assert!(SignalMetrics::try_new(1.2, 0.5, 0.5, 0.5).is_err());
        assert!(SignalMetrics::try_new(0.0, f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn cues_are_trimmed_and_bounded() {
        let cues: Vec<String> = (0..20).map(|i| format!(" cue{} ", i)).collect();
        let m = SignalMetrics::new(0.0, 0.0, 0.0, 0.0).with_cues(cues);
        assert_eq!(m.cues().len(), MAX_CUES);
        assert_eq!(m.cues()[0], "cue0");

        let m = SignalMetrics::new(0.0, 0.0, 0.0, 0.0).with_cues(vec!["", "  ", "frown"]);
        assert_eq!(m.cues(), &["frown".to_string()]);
    }

    #[test]
    fn confidence_is_clamped() {
        let s = VisionSignal::new(
            Emotion::Happy,
            140.0,
            SignalMetrics::new(0.0, 0.0, 0.0, 0.0),
            Timestamp::now(),
        );
        assert_eq!(s.confidence(), 100.0);
    }

    #[test]
    fn freshness_boundaries() {
        let now = Timestamp::now();
        let metrics = SignalMetrics::new(0.0, 0.0, 0.0, 0.0);
        let old = VisionSignal::new(Emotion::Sad, 50.0, metrics.clone(), now.minus_millis(16_000));
        let recent = VisionSignal::new(Emotion::Sad, 50.0, metrics.clone(), now.minus_millis(14_000));
        let edge = VisionSignal::new(Emotion::Sad, 50.0, metrics, now.minus_millis(15_000));

        assert!(!old.is_fresh_at(now, FRESHNESS_HORIZON_MS));
        assert!(recent.is_fresh_at(now, FRESHNESS_HORIZON_MS));
        assert!(edge.is_fresh_at(now, FRESHNESS_HORIZON_MS));
    }

    #[test]
    fn deserialization_reclamps_values() {
        let json = serde_json::json!({
            "emotion": "angry",
            "confidence": 250.0,
            "metrics": { "valence": -4.0, "energy": 2.0, "tension": 0.5, "focus": 0.5 },
            "timestamp": "2024-01-15T10:30:00Z"
        });
        let s: VisionSignal = serde_json::from_value(json).unwrap();
        assert_eq!(s.confidence(), 100.0);
        assert_eq!(s.metrics().valence(), -1.0);
        assert_eq!(s.metrics().energy(), 1.0);
        assert!(s.metrics().cues().is_empty());
        assert!(s.profile_id().is_none());
    }

    proptest! {
        #[test]
        fn constructed_signals_are_always_in_range(
            valence in proptest::num::f64::ANY,
            energy in proptest::num::f64::ANY,
            tension in proptest::num::f64::ANY,
            focus in proptest::num::f64::ANY,
            confidence in proptest::num::f64::ANY,
        ) {
            let s = VisionSignal::new(
                Emotion::Neutral,
                confidence,
                SignalMetrics::new(valence, energy, tension, focus),
                Timestamp::now(),
            );
            let m = s.metrics();
            prop_assert!((-1.0..=1.0).contains(&m.valence()));
            prop_assert!((0.0..=1.0).contains(&m.energy()));
            prop_assert!((0.0..=1.0).contains(&m.tension()));
            prop_assert!((0.0..=1.0).contains(&m.focus()));
            prop_assert!((0.0..=100.0).contains(&s.confidence()));
        }
    }
}
