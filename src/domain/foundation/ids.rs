//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a user profile created by the onboarding quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Creates a new random ProfileId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a ProfileId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_id_new_generates_unique_ids() {
        assert_ne!(ProfileId::new(), ProfileId::new());
    }

    #[test]
    fn profile_id_round_trips_through_string() {
        let id = ProfileId::new();
        let parsed: ProfileId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn profile_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ProfileId>().is_err());
    }

    #[test]
    fn profile_id_serializes_as_plain_string() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&ProfileId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
