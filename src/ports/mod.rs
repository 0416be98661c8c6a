//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Collaborator Ports
//!
//! - `ProfileStore` - Profiles, moods, camera logs and the conversation log
//! - `AIProvider` - Language model completions
//!
//! ## Vision Ports
//!
//! - `CameraDevice` / `CameraStream` - Scoped frame source
//! - `FaceDetector` - Opaque face localisation
//! - `SignalSubscriber` - In-process consumers of vision signals
//! - `SignalRelay` - Cross-context delivery of vision signals

mod ai_provider;
mod camera;
mod face_detector;
mod profile_store;
mod signal_relay;
mod signal_subscriber;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    RequestMetadata, TokenUsage,
};
pub use camera::{CameraDevice, CameraError, CameraPermission, CameraStream};
pub use face_detector::{DetectorError, FaceDetector};
pub use profile_store::ProfileStore;
pub use signal_relay::SignalRelay;
pub use signal_subscriber::SignalSubscriber;
