use crate::defaults;
use crate::error::{MediascribeError, Result};
use crate::models::ModelTier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub decode: DecodeConfig,
    pub stt: SttConfig,
    pub output: OutputConfig,
}

/// External decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecodeConfig {
    /// ffmpeg binary, resolved via PATH unless absolute
    pub ffmpeg: String,
    /// Hard deadline for one decode invocation, in seconds
    pub timeout_secs: u64,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub model: ModelTier,
    pub language: String,
    pub batch_size: usize,
}

/// Transcript output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: defaults::FFMPEG_BIN.to_string(),
            timeout_secs: defaults::DECODE_TIMEOUT_SECS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: ModelTier::Base,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            batch_size: defaults::DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file is missing.
    ///
    /// Invalid TOML is still an error; only a missing file falls back.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(MediascribeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Default config file location: `~/.config/mediascribe/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediascribe")
            .join("config.toml")
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MEDIASCRIBE_MODEL → stt.model
    /// - MEDIASCRIBE_LANGUAGE → stt.language
    /// - MEDIASCRIBE_OUTPUT_DIR → output.dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("MEDIASCRIBE_MODEL")
            && let Ok(tier) = model.parse::<ModelTier>()
        {
            self.stt.model = tier;
        }

        if let Ok(language) = std::env::var("MEDIASCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(dir) = std::env::var("MEDIASCRIBE_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.output.dir = PathBuf::from(dir);
        }

        self
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.stt.batch_size == 0 {
            return Err(MediascribeError::ConfigInvalidValue {
                key: "stt.batch_size".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        if self.decode.timeout_secs == 0 {
            return Err(MediascribeError::ConfigInvalidValue {
                key: "decode.timeout_secs".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        if self.stt.language.is_empty() {
            return Err(MediascribeError::ConfigInvalidValue {
                key: "stt.language".to_string(),
                message: "must be a language code or \"auto\"".to_string(),
            });
        }
        Ok(())
    }
}
