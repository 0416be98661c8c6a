//! SignalRelay port - forwards signals to other processes or contexts.
//!
//! The broadcaster announces each locally produced signal through the relay.
//! Signals arriving from other contexts are handed back to the broadcaster
//! for local delivery only, so they are never re-announced or re-persisted.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::vision::VisionSignal;

#[async_trait]
pub trait SignalRelay: Send + Sync {
    /// Send a locally produced signal to every other context.
    async fn announce(&self, signal: &VisionSignal) -> Result<(), DomainError>;

    /// Relay name for logging.
    fn name(&self) -> &'static str;
}
