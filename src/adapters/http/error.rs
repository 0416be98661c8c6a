//! Mapping from handler errors to HTTP responses.
//!
//! validation → 400, not found → 404, collaborator unavailable → 503.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::application::handlers::{
    LogMoodError, RecordEmotionError, SendChatMessageError, SubmitQuizError,
};
use crate::domain::foundation::{DomainError, ProfileId, ValidationError};

use super::dto::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    ProfileNotFound(ProfileId),
    Unavailable(DomainError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_FAILED", err.to_string())
                    .with_details(serde_json::json!({ "field": err.field() })),
            ),
            ApiError::ProfileNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("PROFILE_NOT_FOUND", format!("Profile not found: {}", id)),
            ),
            ApiError::Unavailable(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new(
                    err.code.to_string(),
                    "The service is temporarily unavailable. Please try again.",
                ),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Unavailable(err) = &self {
            warn!(error = %err, "request failed on a collaborator");
        }
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<SendChatMessageError> for ApiError {
    fn from(err: SendChatMessageError) -> Self {
        match err {
            SendChatMessageError::Validation(e) => ApiError::Validation(e),
            SendChatMessageError::ProfileNotFound(id) => ApiError::ProfileNotFound(id),
            SendChatMessageError::Unavailable(e) => ApiError::Unavailable(e),
        }
    }
}

impl From<SubmitQuizError> for ApiError {
    fn from(err: SubmitQuizError) -> Self {
        match err {
            SubmitQuizError::Validation(e) => ApiError::Validation(e),
            SubmitQuizError::Unavailable(e) => ApiError::Unavailable(e),
        }
    }
}

impl From<LogMoodError> for ApiError {
    fn from(err: LogMoodError) -> Self {
        match err {
            LogMoodError::Validation(e) => ApiError::Validation(e),
            LogMoodError::Unavailable(e) => ApiError::Unavailable(e),
        }
    }
}

impl From<RecordEmotionError> for ApiError {
    fn from(err: RecordEmotionError) -> Self {
        match err {
            RecordEmotionError::Validation(e) => ApiError::Validation(e),
        }
    }
}

/// Parses a profile id supplied by a client.
pub fn parse_profile_id(raw: &str) -> Result<ProfileId, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::Validation(ValidationError::invalid_format(
            "profile_id",
            "expected a UUID",
        ))
    })
}
