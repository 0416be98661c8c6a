//! SendChatMessageHandler - one chat exchange with the companion.
//!
//! Flow:
//! 1. validate the message;
//! 2. load the profile (required);
//! 3. load latest mood, latest camera log and recent turns (optional);
//! 4. look up the live vision signal;
//! 5. compose the context;
//! 6. append the user turn, then ask the model under a timeout;
//! 7. on a reply, append the assistant turn and roll the summary forward.
//!
//! Only steps 1 and 2 can fail the request. Writes are best-effort and a
//! missing reply is reported as `ChatOutcome::NoAnswer`, not as an error.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::vision::SignalDirectory;
use crate::domain::companion::{summarizer, CompanionContext, ContextComposer, HISTORY_LIMIT};
use crate::domain::foundation::{DomainError, ProfileId, Timestamp, ValidationError};
use crate::domain::journal::ConversationTurn;
use crate::ports::{AIProvider, CompletionRequest, ProfileStore, RequestMetadata};

/// Default upper bound on one model call.
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Message shown when the companion has no answer.
pub const NO_ANSWER_MESSAGE: &str =
    "Sorry, I couldn't come up with an answer just now. Please try again in a moment.";

/// Model call settings.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 400,
            timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SendChatMessageCommand {
    pub profile_id: ProfileId,
    pub message: String,
}

/// Why no reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoAnswerReason {
    ProviderFailed,
    TimedOut,
    EmptyReply,
}

/// Result of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Answered { reply: String },
    NoAnswer { reason: NoAnswerReason },
}

impl ChatOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            ChatOutcome::Answered { reply } => Some(reply),
            ChatOutcome::NoAnswer { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SendChatMessageError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Profile not found: {0}")]
    ProfileNotFound(ProfileId),

    #[error("Temporarily unavailable: {0}")]
    Unavailable(DomainError),
}

pub struct SendChatMessageHandler {
    store: Arc<dyn ProfileStore>,
    ai_provider: Arc<dyn AIProvider>,
    live_signals: Arc<SignalDirectory>,
    composer: ContextComposer,
    settings: ChatSettings,
}

impl SendChatMessageHandler {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        ai_provider: Arc<dyn AIProvider>,
        live_signals: Arc<SignalDirectory>,
    ) -> Self {
        Self {
            store,
            ai_provider,
            live_signals,
            composer: ContextComposer::new(),
            settings: ChatSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn handle(
        &self,
        cmd: SendChatMessageCommand,
    ) -> Result<ChatOutcome, SendChatMessageError> {
        let profile_id = cmd.profile_id;

        // 1. Validate
        let user_turn = ConversationTurn::user(profile_id, &cmd.message)?;

        // 2. Required read
        let profile = self
            .store
            .get_profile(profile_id)
            .await
            .map_err(|e| {
                warn!(profile_id = %profile_id, error = %e, "profile read failed");
                SendChatMessageError::Unavailable(e)
            })?
            .ok_or(SendChatMessageError::ProfileNotFound(profile_id))?;

        // 3. Optional reads
        let (mood, camera_log, history) = tokio::join!(
            self.store.get_latest_mood(profile_id),
            self.store.get_latest_camera_log(profile_id),
            self.store.recent_conversation_turns(profile_id, HISTORY_LIMIT),
        );
        let mood = mood.unwrap_or_else(|e| {
            warn!(profile_id = %profile_id, error = %e, "latest mood unavailable");
            None
        });
        let camera_log = camera_log.unwrap_or_else(|e| {
            warn!(profile_id = %profile_id, error = %e, "latest camera log unavailable");
            None
        });
        let history = history.unwrap_or_else(|e| {
            warn!(profile_id = %profile_id, error = %e, "conversation history unavailable");
            Vec::new()
        });

        // 4. Live signal
        let now = Timestamp::now();
        let live = self.live_signals.observe_at(profile_id, now);

        // 5. Compose
        let messages = self.composer.compose(&CompanionContext {
            profile: &profile,
            latest_mood: mood.as_ref(),
            latest_camera_log: camera_log.as_ref(),
            history: &history,
            user_message: &user_turn.content,
            summary: profile.summary(),
            live_signal: live.as_deref(),
            now,
        });
        debug!(
            profile_id = %profile_id,
            messages = messages.len(),
            live_signal = live.is_some(),
            "chat context composed"
        );

        // 6. User turn, then the model
        if let Err(e) = self.store.append_conversation_turn(&user_turn).await {
            warn!(profile_id = %profile_id, error = %e, "user turn write failed");
        }

        let mut request = CompletionRequest::new(RequestMetadata::new(
            profile_id,
            Uuid::new_v4().to_string(),
        ))
        .with_messages(messages)
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens);
        if let Some(model) = &self.settings.model {
            request = request.with_model(model.clone());
        }

        let reply = match tokio::time::timeout(
            self.settings.timeout,
            self.ai_provider.complete(request),
        )
        .await
        {
            Err(_) => {
                warn!(profile_id = %profile_id, timeout = ?self.settings.timeout, "model call timed out");
                return Ok(ChatOutcome::NoAnswer {
                    reason: NoAnswerReason::TimedOut,
                });
            }
            Ok(Err(e)) => {
                warn!(profile_id = %profile_id, error = %e, "model call failed");
                return Ok(ChatOutcome::NoAnswer {
                    reason: NoAnswerReason::ProviderFailed,
                });
            }
            Ok(Ok(response)) => match response.reply_text() {
                Some(text) => text.to_string(),
                None => {
                    warn!(profile_id = %profile_id, "model returned an empty reply");
                    return Ok(ChatOutcome::NoAnswer {
                        reason: NoAnswerReason::EmptyReply,
                    });
                }
            },
        };

        // 7. Assistant turn, then summary
        let assistant_turn = ConversationTurn::assistant(profile_id, reply.clone());
        if let Err(e) = self.store.append_conversation_turn(&assistant_turn).await {
            warn!(profile_id = %profile_id, error = %e, "assistant turn write failed");
        }

        // Roll from the stored summary, not the one read before the model call.
        // Exchanges finishing at the same instant are still last-writer-wins.
        let latest = match self.store.get_profile(profile_id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => profile,
            Err(e) => {
                warn!(profile_id = %profile_id, error = %e, "summary re-read failed, using earlier copy");
                profile
            }
        };
        let summary = summarizer::append(latest.summary(), &user_turn.content, &reply);
        if let Err(e) = self
            .store
            .update_conversation_summary(profile_id, &summary)
            .await
        {
            warn!(profile_id = %profile_id, error = %e, "summary update failed");
        }

        info!(profile_id = %profile_id, "chat exchange answered");
        Ok(ChatOutcome::Answered { reply })
    }
}
