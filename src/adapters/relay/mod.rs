//! SignalRelay adapters.
//!
//! - `LocalSignalRelay` - In-process only; other contexts see nothing
//! - `RedisSignalRelay` - Cross-process delivery over Redis pub/sub

mod local;
mod redis;

pub use self::redis::{RedisSignalRelay, DEFAULT_SIGNAL_CHANNEL};
pub use local::LocalSignalRelay;
