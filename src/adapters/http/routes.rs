//! Axum router configuration.

use axum::http::{header, HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;

use super::handlers::{
    create_profile, get_profile, health, live_emotion, log_mood, record_emotion,
    send_chat_message, AppState,
};

/// API routes, mounted under `/api`.
///
/// # Routes
/// - `POST /profiles` - Submit the onboarding quiz
/// - `GET /profiles/:id` - Profile view
/// - `POST /moods` - Log a mood entry
/// - `POST /emotion` - Publish a client-side reading
/// - `GET /emotion/live` - Fresh signal or 204
/// - `POST /chat` - One chat exchange
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", post(create_profile))
        .route("/profiles/:id", get(get_profile))
        .route("/moods", post(log_mood))
        .route("/emotion", post(record_emotion))
        .route("/emotion/live", get(live_emotion))
        .route("/chat", post(send_chat_message))
}

/// Complete application with tracing, CORS and a request deadline.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::relay::LocalSignalRelay;
    use crate::adapters::store::InMemoryProfileStore;
    use crate::application::handlers::ChatSettings;
    use crate::application::vision::{SignalBroadcaster, SignalDirectory};
    use crate::domain::foundation::ProfileId;
    use crate::domain::journal::Profile;

    fn app_with(store: Arc<InMemoryProfileStore>) -> Router {
        let broadcaster = Arc::new(SignalBroadcaster::new(
            Arc::new(LocalSignalRelay::new()),
            store.clone(),
        ));
        let live_signals = Arc::new(SignalDirectory::new());
        broadcaster.subscribe(live_signals.clone());

        let state = AppState {
            store,
            ai_provider: Arc::new(MockAIProvider::new()),
            broadcaster,
            live_signals,
            chat_settings: ChatSettings::default(),
        };
        build_router(state, &ServerConfig::default())
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app_with(Arc::new(InMemoryProfileStore::new()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_profile_is_404() {
        let app = app_with(Arc::new(InMemoryProfileStore::new()));
        let uri = format!("/api/profiles/{}", ProfileId::new());
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_profile_id_is_400() {
        let app = app_with(Arc::new(InMemoryProfileStore::new()));
        let response = app
            .oneshot(Request::get("/api/profiles/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mood_is_created() {
        let profile = Profile::new("Sekar", "tenang");
        let id = profile.id;
        let store = Arc::new(InMemoryProfileStore::new().with_profile(profile));
        let app = app_with(store.clone());

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/moods",
                serde_json::json!({ "profile_id": id.to_string(), "mood": "cemas" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(store.mood_entries(id).len(), 1);
    }

    #[tokio::test]
    async fn live_emotion_without_reading_is_204() {
        let app = app_with(Arc::new(InMemoryProfileStore::new()));
        let uri = format!("/api/emotion/live?profile_id={}", ProfileId::new());
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn emotion_reading_is_accepted() {
        let app = app_with(Arc::new(InMemoryProfileStore::new()));
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/emotion",
                serde_json::json!({
                    "emotion": "neutral", "confidence": 55.0, "valence": 0.0,
                    "energy": 0.5, "tension": 0.3, "focus": 0.6
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
