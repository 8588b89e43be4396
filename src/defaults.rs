//! Default configuration constants for mediascribe.
//!
//! Shared constants used across configuration types to ensure consistency
//! and eliminate duplication.

/// Audio sample rate the decoder targets, in Hz.
///
/// 16kHz is what Whisper models are trained on; higher rates add cost
/// without accuracy gains for speech.
pub const SAMPLE_RATE: u32 = 16000;

/// Default decoder timeout in seconds.
///
/// ffmpeg extracting an audio track is I/O bound and finishes in seconds for
/// typical clips; five minutes covers long recordings on slow disks.
pub const DECODE_TIMEOUT_SECS: u64 = 300;

/// Default ffmpeg binary name, resolved via PATH.
pub const FFMPEG_BIN: &str = "ffmpeg";

/// Default Whisper model tier.
///
/// "base" balances speed and accuracy for most content.
pub const DEFAULT_MODEL: &str = "base";

/// Default language code for transcription.
///
/// "auto" lets Whisper detect the spoken language automatically.
/// Set to a specific code (e.g., "en", "de") to force a language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default inference batch size.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Default directory for persisted transcripts, relative to the working dir.
pub const DEFAULT_OUTPUT_DIR: &str = "transcripts";

/// Bound for the per-run event channel.
///
/// A run emits a handful of progress events plus one terminal event; the
/// bound only matters if a consumer stops draining entirely.
pub const EVENT_BUFFER: usize = 64;

/// Number of trailing decoder stderr bytes carried in DecodeFailed details.
pub const STDERR_TAIL_BYTES: usize = 2048;

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
