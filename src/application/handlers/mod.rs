//! Application handlers.
//!
//! Command handlers that validate input, call ports and translate collaborator
//! failures into handler-specific errors.

mod log_mood;
mod record_emotion;
mod send_chat_message;
mod submit_quiz;

pub use log_mood::{LogMoodCommand, LogMoodError, LogMoodHandler};
pub use record_emotion::{RecordEmotionCommand, RecordEmotionError, RecordEmotionHandler};
pub use send_chat_message::{
    ChatOutcome, ChatSettings, NoAnswerReason, SendChatMessageCommand, SendChatMessageError,
    SendChatMessageHandler, DEFAULT_CHAT_TIMEOUT, NO_ANSWER_MESSAGE,
};
pub use submit_quiz::{SubmitQuizError, SubmitQuizHandler};
