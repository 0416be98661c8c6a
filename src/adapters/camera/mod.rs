//! Camera and face detector adapters.
//!
//! Hardware capture and the face landmark model are not part of this crate.
//! `ScriptedCamera` replays a fixed sequence of frames and faults, and
//! `FixedFaceDetector` returns a preset region, which is enough to drive the
//! frame sampler in demos and tests.

mod scripted;

pub use scripted::{FixedFaceDetector, ScriptStep, ScriptedCamera};
