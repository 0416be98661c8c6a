//! ProfileStore adapters.
//!
//! - `InMemoryProfileStore` - Process-local store with failure injection
//! - `PostgresProfileStore` - PostgreSQL persistence via sqlx

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryProfileStore, StoreOperation};
pub use postgres::PostgresProfileStore;
