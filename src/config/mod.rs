//! Application configuration module
//!
//! Configuration is loaded from environment variables (and an optional
//! `.env` file) using the `config` and `dotenvy` crates. Variables carry the
//! `MOODLENS` prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use moodlens::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod database;
mod error;
mod redis;
mod server;
mod vision;

pub use self::redis::RedisConfig;
pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use vision::VisionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection; absent means the in-memory store
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Redis pub/sub; absent means in-process signal delivery only
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// Language model provider
    #[serde(default)]
    pub ai: AiConfig,

    /// Vision pipeline timing
    #[serde(default)]
    pub vision: VisionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `MOODLENS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `MOODLENS__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MOODLENS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.ai.validate(self.is_production())?;
        self.vision.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
