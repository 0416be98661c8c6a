//! In-process signal relay.
//!
//! Used when no Redis is configured. Signals reach subscribers inside this
//! process only; other processes and browser contexts do not see them.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

use crate::domain::foundation::DomainError;
use crate::domain::vision::VisionSignal;
use crate::ports::SignalRelay;

#[derive(Debug, Default)]
pub struct LocalSignalRelay {
    announced: AtomicUsize,
}

impl LocalSignalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of signals announced so far.
    pub fn announced(&self) -> usize {
        self.announced.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SignalRelay for LocalSignalRelay {
    async fn announce(&self, signal: &VisionSignal) -> Result<(), DomainError> {
        self.announced.fetch_add(1, Ordering::Relaxed);
        trace!(emotion = %signal.emotion(), "local relay: no remote contexts");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
