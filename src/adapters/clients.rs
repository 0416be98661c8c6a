//! Process-wide client handles.
//!
//! The HTTP client and the PostgreSQL pool are built once, on first use, and
//! shared by every adapter afterwards. Later calls never reconfigure them.
//! Adapters also accept injected handles so tests can build their own.

use once_cell::sync::OnceCell;
use reqwest::Client;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;
use crate::ports::AIError;

static HTTP_CLIENT: OnceCell<Client> = OnceCell::new();
static PG_POOL: tokio::sync::OnceCell<PgPool> = tokio::sync::OnceCell::const_new();

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared outbound HTTP client.
pub fn http_client() -> Result<Client, AIError> {
    HTTP_CLIENT
        .get_or_try_init(|| {
            Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .user_agent(concat!("moodlens/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| AIError::network(format!("Failed to build HTTP client: {}", e)))
        })
        .cloned()
}

/// Shared PostgreSQL pool, connected on first call.
pub async fn pg_pool(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    PG_POOL
        .get_or_try_init(|| async {
            let pool = PgPoolOptions::new()
                .min_connections(config.min_connections)
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout())
                .idle_timeout(config.idle_timeout())
                .connect(&config.url)
                .await
                .map_err(|e| DomainError::database(format!("Failed to connect: {}", e)))?;
            info!(max_connections = config.max_connections, "postgres pool ready");
            Ok::<_, DomainError>(pool)
        })
        .await
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_is_built_once() {
        assert!(http_client().is_ok());
        assert!(HTTP_CLIENT.get().is_some());
        assert!(http_client().is_ok());
    }
}
