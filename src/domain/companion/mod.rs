//! Companion module - context composition and the rolling conversation summary.

mod composer;
mod message;
pub mod summarizer;

pub use composer::{
    relative_age, trim_history, CompanionContext, ContextComposer, HISTORY_LIMIT,
    NO_MOOD_LOGGED, NO_SUMMARY, NO_VISION_READING,
};
pub use message::{ContextMessage, MessageRole};
pub use summarizer::{ENTRY_CHAR_LIMIT, SUMMARY_CAPACITY};
