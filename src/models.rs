//! Whisper model tiers and on-disk resolution.
//!
//! Maps the enumerated model tiers onto ggml model files and locates
//! installed models. Models are expected to be installed out of band
//! (e.g. downloaded from the whisper.cpp releases); mediascribe only
//! resolves them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Whisper model size tiers, smallest to largest.
///
/// Larger tiers are slower and more accurate. All tiers here are the
/// multilingual variants so language auto-detection works uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelTier {
    /// All tiers, for listings.
    pub const ALL: &[ModelTier] = &[
        ModelTier::Tiny,
        ModelTier::Base,
        ModelTier::Small,
        ModelTier::Medium,
        ModelTier::Large,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "tiny",
            ModelTier::Base => "base",
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }

    /// The ggml model file name for this tier.
    pub fn file_name(&self) -> String {
        format!("ggml-{}.bin", self.as_str())
    }

    /// Approximate model size on disk, in megabytes.
    pub fn size_mb(&self) -> u32 {
        match self {
            ModelTier::Tiny => 75,
            ModelTier::Base => 142,
            ModelTier::Small => 466,
            ModelTier::Medium => 1533,
            ModelTier::Large => 3094,
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiny" => Ok(ModelTier::Tiny),
            "base" => Ok(ModelTier::Base),
            "small" => Ok(ModelTier::Small),
            "medium" => Ok(ModelTier::Medium),
            "large" => Ok(ModelTier::Large),
            other => Err(format!(
                "unknown model tier '{}' (expected tiny, base, small, medium or large)",
                other
            )),
        }
    }
}

/// Directories searched for installed model files, in priority order.
///
/// The user cache dir (`~/.cache/mediascribe/models`) first, then a local
/// `models/` dir next to the working directory.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs_list = Vec::new();
    if let Some(cache) = dirs::cache_dir() {
        dirs_list.push(cache.join("mediascribe").join("models"));
    }
    dirs_list.push(PathBuf::from("models"));
    dirs_list
}

/// Locate the model file for a tier, if installed.
pub fn installed_path(tier: ModelTier) -> Option<PathBuf> {
    let file_name = tier.file_name();
    search_dirs()
        .into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.exists())
}
