//! SignalSubscriber port - consumers of freshly published vision signals.

use std::sync::Arc;

use crate::domain::vision::VisionSignal;

/// Receives every signal published after registration.
///
/// Delivery is synchronous and must not block: implementations replace
/// whatever they hold and return. Subscribers never see signals published
/// before they registered.
pub trait SignalSubscriber: Send + Sync {
    fn deliver(&self, signal: Arc<VisionSignal>);

    /// Subscriber name for logging.
    fn name(&self) -> &'static str;
}
