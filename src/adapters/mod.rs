//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Language model providers (OpenAI, mock)
//! - `store` - Profile store (PostgreSQL, in-memory)
//! - `relay` - Cross-context signal delivery (Redis, local)
//! - `camera` - Scripted camera and face detector
//! - `http` - axum REST API
//! - `clients` - Shared HTTP client and database pool

pub mod ai;
pub mod camera;
pub mod clients;
pub mod http;
pub mod relay;
pub mod store;
