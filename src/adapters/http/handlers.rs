//! HTTP handlers connecting axum routes to application handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::handlers::{
    ChatSettings, LogMoodCommand, LogMoodHandler, RecordEmotionCommand, RecordEmotionHandler,
    SendChatMessageCommand, SendChatMessageHandler, SubmitQuizHandler,
};
use crate::application::vision::{SignalBroadcaster, SignalDirectory};
use crate::domain::foundation::Timestamp;
use crate::domain::journal::QuizSubmission;
use crate::ports::{AIProvider, ProfileStore};

use super::dto::{
    ChatRequest, ChatResponse, HealthResponse, LiveSignalQuery, LiveSignalResponse,
    LogMoodRequest, MoodEntryResponse, ProfileCreatedResponse, ProfileResponse,
    RecordEmotionRequest,
};
use super::error::{parse_profile_id, ApiError};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared dependencies, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub ai_provider: Arc<dyn AIProvider>,
    pub broadcaster: Arc<SignalBroadcaster>,
    pub live_signals: Arc<SignalDirectory>,
    pub chat_settings: ChatSettings,
}

impl AppState {
    pub fn submit_quiz_handler(&self) -> SubmitQuizHandler {
        SubmitQuizHandler::new(self.store.clone())
    }

    pub fn log_mood_handler(&self) -> LogMoodHandler {
        LogMoodHandler::new(self.store.clone())
    }

    pub fn record_emotion_handler(&self) -> RecordEmotionHandler {
        RecordEmotionHandler::new(self.broadcaster.clone())
    }

    pub fn send_chat_message_handler(&self) -> SendChatMessageHandler {
        SendChatMessageHandler::new(
            self.store.clone(),
            self.ai_provider.clone(),
            self.live_signals.clone(),
        )
        .with_settings(self.chat_settings.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /api/profiles - Submit the onboarding quiz
pub async fn create_profile(
    State(state): State<AppState>,
    Json(submission): Json<QuizSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.submit_quiz_handler().handle(submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProfileCreatedResponse {
            profile_id: profile.id,
        }),
    ))
}

/// GET /api/profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_profile_id(&raw_id)?;
    let profile = state
        .store
        .get_profile(id)
        .await
        .map_err(ApiError::Unavailable)?
        .ok_or(ApiError::ProfileNotFound(id))?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// POST /api/moods
pub async fn log_mood(
    State(state): State<AppState>,
    Json(request): Json<LogMoodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = LogMoodCommand {
        profile_id: parse_profile_id(&request.profile_id)?,
        mood: request.mood,
        note: request.note,
        source: request.source,
    };
    let entry = state.log_mood_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(MoodEntryResponse::from(entry))))
}

/// POST /api/emotion - Accept a client-side reading
pub async fn record_emotion(
    State(state): State<AppState>,
    Json(request): Json<RecordEmotionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile_id = request
        .profile_id
        .as_deref()
        .map(parse_profile_id)
        .transpose()?;
    let cmd = RecordEmotionCommand {
        profile_id,
        emotion: request.emotion,
        confidence: request.confidence,
        valence: request.valence,
        energy: request.energy,
        tension: request.tension,
        focus: request.focus,
        tilt: request.tilt,
        cues: request.cues,
    };
    let outcome = state.record_emotion_handler().handle(cmd).await?;
    Ok((StatusCode::ACCEPTED, Json(outcome)))
}

/// GET /api/emotion/live - The fresh signal, or 204 when none
pub async fn live_emotion(
    State(state): State<AppState>,
    Query(query): Query<LiveSignalQuery>,
) -> Result<Response, ApiError> {
    let now = Timestamp::now();
    let signal = match query.profile_id.as_deref() {
        Some(raw) => state.live_signals.observe_at(parse_profile_id(raw)?, now),
        None => state.live_signals.observe_unassociated(),
    };

    Ok(match signal {
        Some(signal) => Json(LiveSignalResponse::from_signal(&signal, now)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// POST /api/chat
pub async fn send_chat_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = SendChatMessageCommand {
        profile_id: parse_profile_id(&request.profile_id)?,
        message: request.message,
    };
    let outcome = state.send_chat_message_handler().handle(cmd).await?;
    Ok(Json(ChatResponse::from(outcome)))
}
