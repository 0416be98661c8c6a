//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Milliseconds elapsed from `earlier` to this timestamp.
    pub fn millis_since(&self, earlier: &Timestamp) -> i64 {
        self.duration_since(earlier).num_milliseconds()
    }

    /// Creates a new timestamp by subtracting milliseconds.
    pub fn minus_millis(&self, millis: i64) -> Self {
        Self(self.0 - Duration::milliseconds(millis))
    }

    /// Creates a new timestamp by adding milliseconds.
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0 + Duration::milliseconds(millis))
    }

    /// Creates a timestamp from Unix milliseconds.
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Returns the timestamp as Unix milliseconds.
    pub fn as_unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn millis_since_measures_offsets() {
        let now = Timestamp::now();
        let earlier = now.minus_millis(16_000);
        assert_eq!(now.millis_since(&earlier), 16_000);
        assert_eq!(earlier.millis_since(&now), -16_000);
    }

    #[test]
    fn plus_and_minus_are_inverse() {
        let now = Timestamp::now();
        assert_eq!(now.plus_millis(250).minus_millis(250), now);
    }

    #[test]
    fn unix_millis_round_trip() {
        let ts = Timestamp::from_unix_millis(1_705_314_600_000).unwrap();
        assert_eq!(ts.as_unix_millis(), 1_705_314_600_000);
    }

    #[test]
    fn timestamp_serializes_to_rfc3339() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_string(&Timestamp::from_datetime(dt)).unwrap();
        assert_eq!(json, "\"2024-01-15T10:30:00Z\"");
    }
}
