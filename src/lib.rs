//! mediascribe - Offline media transcription
//!
//! Decode a media file with ffmpeg, run Whisper inference on the audio and
//! write the transcript next to where you asked for it.

// Enforce error handling discipline in library code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod artifact;
pub mod cli;
pub mod config;
pub mod decode;
pub mod defaults;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod stt;
pub mod transcript;

// Core traits (decode → transcribe → persist)
pub use decode::MediaDecoder;
pub use stt::engine::SpeechEngine;

// Pipeline
pub use pipeline::{PipelineEvent, ProgressDetail, RunHandle, Stage, TranscriptionResult, WorkerScheduler};
pub use pipeline::orchestrator::RunRequest;

// Error handling
pub use error::{ErrorKind, MediascribeError, Result};

// Config
pub use config::Config;
pub use models::ModelTier;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
