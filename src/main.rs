//! Moodlens server binary.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use moodlens::adapters::ai::{MockAIProvider, OpenAIConfig, OpenAIProvider};
use moodlens::adapters::camera::{FixedFaceDetector, ScriptedCamera};
use moodlens::adapters::clients;
use moodlens::adapters::http::{build_router, AppState};
use moodlens::adapters::relay::{LocalSignalRelay, RedisSignalRelay};
use moodlens::adapters::store::{InMemoryProfileStore, PostgresProfileStore};
use moodlens::application::vision::{FrameSampler, SignalBroadcaster, SignalDirectory};
use moodlens::config::{AppConfig, ServerConfig, VisionConfig};
use moodlens::domain::vision::{BrightnessExtractor, FaceRegion, Frame};
use moodlens::ports::{AIProvider, ProfileStore, SignalRelay};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let store: Arc<dyn ProfileStore> = match &config.database {
        Some(database) => {
            let store = PostgresProfileStore::new(clients::pg_pool(database).await?);
            if database.run_migrations {
                store.migrate().await?;
                info!("database migrations applied");
            }
            Arc::new(store)
        }
        None => {
            warn!("no database configured, using the in-memory store");
            Arc::new(InMemoryProfileStore::new())
        }
    };

    let ai_provider: Arc<dyn AIProvider> = match &config.ai.openai_api_key {
        Some(key) if config.ai.has_openai() => {
            let openai = OpenAIConfig::from_secret(key.clone())
                .with_model(config.ai.model.clone())
                .with_base_url(config.ai.base_url.clone())
                .with_timeout(config.ai.timeout())
                .with_max_retries(config.ai.max_retries);
            Arc::new(OpenAIProvider::new(openai, clients::http_client()?))
        }
        _ => {
            warn!("no OpenAI key configured, chat replies come from the mock provider");
            Arc::new(MockAIProvider::new())
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let redis_relay = match &config.redis {
        Some(redis) => {
            Some(RedisSignalRelay::connect(&redis.url, redis.signal_channel.clone()).await?)
        }
        None => {
            warn!("no redis configured, vision signals stay inside this process");
            None
        }
    };
    let relay: Arc<dyn SignalRelay> = match &redis_relay {
        Some(relay) => Arc::new(relay.clone()),
        None => Arc::new(LocalSignalRelay::new()),
    };

    let broadcaster = Arc::new(
        SignalBroadcaster::new(relay, store.clone())
            .with_persist_throttle(config.vision.persist_throttle()),
    );
    let live_signals = Arc::new(SignalDirectory::with_horizon(
        config.vision.freshness_horizon_ms,
    ));
    broadcaster.subscribe(live_signals.clone());

    if let Some(relay) = &redis_relay {
        relay
            .spawn_listener(broadcaster.clone(), shutdown_rx.clone())
            .await?;
    }

    if config.vision.demo_camera {
        spawn_demo_sampler(&config.vision, broadcaster.clone(), shutdown_rx.clone())?;
    }

    let state = AppState {
        store,
        ai_provider,
        broadcaster,
        live_signals,
        chat_settings: config.ai.chat_settings(),
    };
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "moodlens listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

/// Runs the frame sampler against a scripted camera that cycles through a
/// few lighting conditions, then holds the last one.
fn spawn_demo_sampler(
    vision: &VisionConfig,
    broadcaster: Arc<SignalBroadcaster>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut camera = ScriptedCamera::new();
    for shade in [220u8, 160, 120, 90] {
        camera = camera.with_frame(Frame::solid(64, 48, [shade, shade, shade])?);
    }

    let sampler = Arc::new(
        FrameSampler::new(
            Arc::new(camera),
            Arc::new(FixedFaceDetector::new(Some(FaceRegion::new(16, 8, 32, 32)))),
            Arc::new(BrightnessExtractor::new(vision.sample_stride)),
            broadcaster,
        )
        .with_interval(vision.sample_interval()),
    );

    let handle = sampler.spawn(shutdown);
    tokio::spawn(async move {
        match handle.await {
            Ok(state) => info!(?state, "demo sampler finished"),
            Err(e) => error!(error = %e, "demo sampler task failed"),
        }
    });
    Ok(())
}
