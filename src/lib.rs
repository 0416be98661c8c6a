//! Moodlens - mood journaling with an empathic chat companion.
//!
//! A live camera feed is reduced to a bounded mood signal, broadcast to
//! every interested view, and fused with the stored profile, mood history
//! and conversation into the context sent to a language model.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
