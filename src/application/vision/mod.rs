//! Vision pipeline orchestration: sampling, broadcast and live lookup.

mod broadcaster;
mod directory;
mod frame_sampler;

pub use broadcaster::{PublishOutcome, SignalBroadcaster, DEFAULT_PERSIST_THROTTLE};
pub use directory::SignalDirectory;
pub use frame_sampler::{FrameSampler, SamplerState, DEFAULT_DETECT_TIMEOUT, DEFAULT_SAMPLE_INTERVAL};
