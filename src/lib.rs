//! `livesub`: live subtitle generation driven by an external Whisper recognizer.
//!
//! This crate provides:
//! - A lifecycle controller that runs at most one transcription in the background
//! - Streaming parsing of the recognizer's verbose segment output
//! - Incremental, flushed SRT writing with safe finalization and cooperative cancellation
//! - A progress feed for frontends (CLI, GUI log panes)
//!
//! The recognizer itself (audio decoding, the ASR model) is an opaque external process.

// High-level API (most consumers should start here).
pub mod controller;
pub mod opts;

// A single run and its building blocks.
pub mod cancel;
pub mod events;
pub mod run;

// Recognizer process management.
pub mod language;
pub mod recognizer;

// Segment parsing and time codes.
pub mod segment_line;
pub mod segments;
pub mod timecode;

// Output paths and the SRT sink.
pub mod paths;
pub mod srt_encoder;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use cancel::CancelToken;
pub use controller::{Controller, StartStatus};
pub use error::{Error, Result};
pub use events::{Observer, RunEvent};
pub use language::Language;
pub use opts::{EngineOpts, Opts};
pub use recognizer::{ExternalRecognizer, Recognizer};
pub use run::{RunOutcome, RunState};
pub use segments::Segment;
pub use timecode::TimeCode;
