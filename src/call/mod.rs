//! Client-side call session management
//!
//! This module provides the `CallSessionController` state machine that:
//! - drives the call lifecycle (idle, connecting, conversation, ended)
//! - merges interim/final speech fragments into an ordered message log
//! - tracks call duration and the per-role speaking indicator
//! - formats the finished session for export
//!
//! The voice engine is consumed through the `VoiceEngine` trait as an
//! opaque event source.

mod controller;
mod engine;
mod export;

pub use controller::{drive, CallSessionController, CallState, ChatMessage};
pub use engine::{EngineEvent, SpeechFragment, VoiceEngine};
pub use export::{export_filename, format_duration, format_transcript, ExportLabels};
