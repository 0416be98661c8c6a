//! HTTP adapter - REST API over the application handlers.
//!
//! - `GET /health`
//! - `POST /api/profiles`, `GET /api/profiles/:id`
//! - `POST /api/moods`
//! - `POST /api/emotion`, `GET /api/emotion/live`
//! - `POST /api/chat`

pub mod dto;
mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use handlers::AppState;
pub use routes::{api_routes, build_router};
