//! Domain layer - pure types and algorithms with no I/O.
//!
//! - `foundation`: identifiers, timestamps, percentages and errors
//! - `vision`: frames, the signal extractor and the per-consumer cache
//! - `journal`: profiles, moods, camera logs and conversation turns
//! - `companion`: context composition and the rolling summary

pub mod companion;
pub mod foundation;
pub mod journal;
pub mod vision;
