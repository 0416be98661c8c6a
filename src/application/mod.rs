//! Application layer - orchestration over domain types and ports.
//!
//! - `vision`: the camera loop, the signal broadcaster and live lookup
//! - `handlers`: chat, emotion intake, mood logging and onboarding

pub mod handlers;
pub mod vision;

pub use handlers::{
    ChatOutcome, ChatSettings, LogMoodCommand, LogMoodHandler, RecordEmotionCommand,
    RecordEmotionHandler, SendChatMessageCommand, SendChatMessageHandler, SubmitQuizHandler,
};
pub use vision::{FrameSampler, PublishOutcome, SamplerState, SignalBroadcaster, SignalDirectory};
