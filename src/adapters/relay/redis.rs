//! Redis pub/sub signal relay for multi-process deployments.
//!
//! Every relay instance tags outgoing messages with a random origin id.
//! The listener drops messages carrying its own origin, so a process never
//! receives its own signals twice. Inbound signals go to
//! `SignalBroadcaster::deliver_local`, which neither re-announces nor
//! persists them.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::vision::SignalBroadcaster;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::vision::VisionSignal;
use crate::ports::SignalRelay;

/// Default pub/sub channel for vision signals.
pub const DEFAULT_SIGNAL_CHANNEL: &str = "moodlens:vision-signals";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    origin: Uuid,
    signal: VisionSignal,
}

/// Redis-backed relay.
#[derive(Clone)]
pub struct RedisSignalRelay {
    client: redis::Client,
    conn: MultiplexedConnection,
    channel: String,
    origin: Uuid,
}

impl RedisSignalRelay {
    /// Connects to Redis and prepares a publishing connection.
    pub async fn connect(url: &str, channel: impl Into<String>) -> Result<Self, DomainError> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(cache_error)?;

        Ok(Self {
            client,
            conn,
            channel: channel.into(),
            origin: Uuid::new_v4(),
        })
    }

    /// Origin id stamped on every message from this instance.
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Subscribes to the channel and feeds foreign signals into the
    /// broadcaster until `shutdown` flips to true.
    pub async fn spawn_listener(
        &self,
        broadcaster: Arc<SignalBroadcaster>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, DomainError> {
        // Pub/sub needs a dedicated connection; the multiplexed one keeps publishing
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(cache_error)?
            .into_pubsub();
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(cache_error)?;

        let origin = self.origin;
        let channel = self.channel.clone();
        info!(channel = %channel, origin = %origin, "redis signal listener subscribed");

        Ok(tokio::spawn(async move {
            let messages = pubsub.on_message();
            tokio::pin!(messages);
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    message = messages.next() => {
                        let Some(message) = message else {
                            warn!(channel = %channel, "redis signal stream closed");
                            break;
                        };
                        let payload: String = match message.get_payload() {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(error = %e, "unreadable redis payload");
                                continue;
                            }
                        };
                        if let Some(signal) = decode_foreign(origin, &payload) {
                            let delivered = broadcaster.deliver_local(Arc::new(signal));
                            debug!(delivered, "relayed signal delivered locally");
                        }
                    }
                }
            }
            info!(channel = %channel, "redis signal listener stopped");
        }))
    }
}

#[async_trait]
impl SignalRelay for RedisSignalRelay {
    async fn announce(&self, signal: &VisionSignal) -> Result<(), DomainError> {
        let payload = encode(self.origin, signal)?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&self.channel, payload)
            .await
            .map_err(cache_error)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisSignalRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSignalRelay")
            .field("channel", &self.channel)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

fn cache_error(err: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("Redis error: {}", err))
}

fn encode(origin: Uuid, signal: &VisionSignal) -> Result<String, DomainError> {
    serde_json::to_string(&Envelope {
        origin,
        signal: signal.clone(),
    })
    .map_err(|e| DomainError::new(ErrorCode::InternalError, format!("Encode failed: {}", e)))
}

/// Decodes a message, dropping malformed payloads and our own echoes.
fn decode_foreign(own_origin: Uuid, payload: &str) -> Option<VisionSignal> {
    match serde_json::from_str::<Envelope>(payload) {
        Ok(envelope) if envelope.origin == own_origin => None,
        Ok(envelope) => Some(envelope.signal),
        Err(e) => {
            warn!(error = %e, "malformed relayed signal dropped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    // Pub/sub round trips need a running Redis instance and are run
    // separately with `cargo test -- --ignored`.

    use super::*;
    use crate::domain::foundation::{ProfileId, Timestamp};
    use crate::domain::vision::{Emotion, SignalMetrics};

    fn signal() -> VisionSignal {
        VisionSignal::new(
            Emotion::Tired,
            64.0,
            SignalMetrics::new(-0.2, 0.2, 0.5, 0.3).with_cues(["slow blink"]),
            Timestamp::now(),
        )
        .with_profile(Some(ProfileId::new()))
    }

    #[test]
    fn own_echo_is_ignored() {
        let origin = Uuid::new_v4();
        let payload = encode(origin, &signal()).unwrap();
        assert!(decode_foreign(origin, &payload).is_none());
    }

    #[test]
    fn foreign_signal_is_accepted_intact() {
        let original = signal();
        let payload = encode(Uuid::new_v4(), &original).unwrap();
        let received = decode_foreign(Uuid::new_v4(), &payload).unwrap();
        assert_eq!(received, original);
    }

    #[test]
    fn malformed_payload_is_dropped() {
        assert!(decode_foreign(Uuid::new_v4(), "{\"origin\":42}").is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn foreign_signal_reaches_local_subscribers() {
        use crate::adapters::relay::LocalSignalRelay;
        use crate::adapters::store::InMemoryProfileStore;
        use crate::application::vision::SignalDirectory;
        use std::time::Duration;

        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let channel = format!("moodlens:test:{}", Uuid::new_v4());
        let listener = RedisSignalRelay::connect(&url, channel.clone()).await.unwrap();
        let sender = RedisSignalRelay::connect(&url, channel).await.unwrap();

        let broadcaster = Arc::new(SignalBroadcaster::new(
            Arc::new(LocalSignalRelay::new()),
            Arc::new(InMemoryProfileStore::new()),
        ));
        let directory = Arc::new(SignalDirectory::new());
        broadcaster.subscribe(directory.clone());

        let (stop, shutdown) = watch::channel(false);
        let handle = listener.spawn_listener(broadcaster, shutdown).await.unwrap();

        let sent = signal();
        let profile_id = sent.profile_id().unwrap();
        sender.announce(&sent).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(directory.observe(profile_id).unwrap().emotion(), Emotion::Tired);
        stop.send(true).unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn out_of_range_inbound_values_are_clamped() {
        let payload = format!(
            r#"{{"origin":"{}","signal":{{"emotion":"sad","confidence":250.0,
               "metrics":{{"valence":-3.0,"energy":0.5,"tension":2.0,"focus":0.1}},
               "timestamp":"2026-01-01T00:00:00Z"}}}}"#,
            Uuid::new_v4()
        );
        let received = decode_foreign(Uuid::new_v4(), &payload).unwrap();
        assert_eq!(received.confidence(), 100.0);
        assert_eq!(received.metrics().valence(), -1.0);
        assert_eq!(received.metrics().tension(), 1.0);
    }
}
