//! Error types for mediascribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediascribeError {
    // Configuration errors (surface before a run starts, never as run events)
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Decode errors
    #[error("Input file not found: {path}")]
    NotFound { path: String },

    #[error("Decoder failed: {detail}")]
    DecodeFailed { detail: String },

    #[error("Decoder timed out after {seconds}s")]
    DecodeTimeout { seconds: u64 },

    #[error("Decoder produced no audio artifact at {path}")]
    ArtifactMissing { path: String },

    // Inference errors
    #[error("Failed to load speech model: {message}")]
    EngineLoadFailed { message: String },

    #[error("Audio artifact unusable: {message}")]
    InvalidAudio { message: String },

    #[error("Inference failed: {message}")]
    EngineError { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable error taxonomy for event consumers.
///
/// Consumers dispatch on these kinds, never on `MediascribeError` variants,
/// so internal error representations can change without breaking them.
/// Cancellation is deliberately absent: it is a terminal event, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DecodeFailed,
    Timeout,
    ArtifactMissing,
    EngineLoadFailed,
    InvalidAudio,
    EngineError,
    IoError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::DecodeFailed => "DecodeFailed",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ArtifactMissing => "ArtifactMissing",
            ErrorKind::EngineLoadFailed => "EngineLoadFailed",
            ErrorKind::InvalidAudio => "InvalidAudio",
            ErrorKind::EngineError => "EngineError",
            ErrorKind::IoError => "IOError",
        };
        write!(f, "{}", name)
    }
}

impl MediascribeError {
    /// Map this error onto the consumer-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediascribeError::NotFound { .. } => ErrorKind::NotFound,
            MediascribeError::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            MediascribeError::DecodeTimeout { .. } => ErrorKind::Timeout,
            MediascribeError::ArtifactMissing { .. } => ErrorKind::ArtifactMissing,
            MediascribeError::EngineLoadFailed { .. } => ErrorKind::EngineLoadFailed,
            MediascribeError::InvalidAudio { .. } => ErrorKind::InvalidAudio,
            MediascribeError::EngineError { .. } => ErrorKind::EngineError,
            // Config problems abort before a run exists; if one ever reaches
            // a consumer it is an environment issue, same as I/O.
            MediascribeError::ConfigParse { .. }
            | MediascribeError::ConfigInvalidValue { .. }
            | MediascribeError::Config(_)
            | MediascribeError::Io(_) => ErrorKind::IoError,
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MediascribeError>;
