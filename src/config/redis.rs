//! Redis configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::relay::DEFAULT_SIGNAL_CHANNEL;

/// Redis configuration for cross-process signal delivery. When the section
/// is absent, signals stay inside the process.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Pub/sub channel carrying vision signals
    #[serde(default = "default_signal_channel")]
    pub signal_channel: String,
}

impl RedisConfig {
    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.signal_channel.trim().is_empty() {
            return Err(ValidationError::EmptyRedisChannel);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            signal_channel: default_signal_channel(),
        }
    }
}

fn default_signal_channel() -> String {
    DEFAULT_SIGNAL_CHANNEL.to_string()
}
