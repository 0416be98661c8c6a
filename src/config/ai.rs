//! AI provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::handlers::ChatSettings;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key. Without one, development builds answer from the mock
    /// provider.
    pub openai_api_key: Option<Secret<String>>,

    /// Chat model
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Reply length cap in tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Overall deadline for one chat reply in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Settings for the chat handler.
    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            model: Some(self.model.clone()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.timeout(),
        }
    }

    /// Validate AI configuration. A key is mandatory only in production.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if production && !self.has_openai() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidAiBaseUrl);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 || self.max_tokens > 4096 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    400
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
        assert!(!config.has_openai());
    }

    #[test]
    fn test_chat_settings_follow_config() {
        let config = AiConfig {
            temperature: 0.3,
            max_tokens: 200,
            timeout_secs: 12,
            ..Default::default()
        };
        let settings = config.chat_settings();
        assert_eq!(settings.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(settings.temperature, 0.3);
        assert_eq!(settings.max_tokens, 200);
        assert_eq!(settings.timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let config = AiConfig {
            openai_api_key: Some(Secret::new("  ".to_string())),
            ..Default::default()
        };
        assert!(!config.has_openai());
    }

    #[test]
    fn test_key_required_only_in_production() {
        let config = AiConfig::default();
        assert!(config.validate(false).is_ok());
        assert_eq!(
            config.validate(true),
            Err(ValidationError::MissingRequired("OPENAI_API_KEY"))
        );

        let config = AiConfig {
            openai_api_key: Some(Secret::new("sk-test".to_string())),
            ..Default::default()
        };
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_validation_ranges() {
        let bad_temperature = AiConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert_eq!(
            bad_temperature.validate(false),
            Err(ValidationError::InvalidTemperature)
        );

        let bad_tokens = AiConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert_eq!(bad_tokens.validate(false), Err(ValidationError::InvalidMaxTokens));

        let bad_url = AiConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(bad_url.validate(false), Err(ValidationError::InvalidAiBaseUrl));
    }
}
