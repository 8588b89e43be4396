//! Whisper backend for the SpeechEngine trait, via whisper-rs.
//!
//! # Feature Gate
//!
//! Requires the `whisper` feature (enabled by default) and cmake to build.
//! Without it a stub is compiled that fails at load time with instructions.

use crate::error::{MediascribeError, Result};
use crate::stt::engine::{EngineSpec, SpeechEngine, TranscriptSegment};
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Whisper-based speech engine.
///
/// Decoding is fixed to deterministic greedy behavior: temperature zero,
/// best-of one, timestamps disabled. The WhisperContext is wrapped in a
/// Mutex for thread safety.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    context: Mutex<WhisperContext>,
    spec: EngineSpec,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("spec", &self.spec)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper engine placeholder (without the whisper feature).
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperEngine {
    spec: EngineSpec,
    model_name: String,
}

fn model_name_from_path(model_path: &PathBuf) -> String {
    model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    /// Load a Whisper model from `model_path` for the given spec.
    ///
    /// # Errors
    /// Returns `MediascribeError::EngineLoadFailed` if the model file is
    /// missing or model loading fails.
    pub fn load(model_path: PathBuf, spec: EngineSpec) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !model_path.exists() {
            return Err(MediascribeError::EngineLoadFailed {
                message: format!("model file not found at {}", model_path.display()),
            });
        }

        let model_name = model_name_from_path(&model_path);

        let mut context_params = WhisperContextParameters::default();
        // Fused attention kernels; also avoids the standalone softmax CUDA
        // kernel that crashes on sm_120 GPUs with older ggml.
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| MediascribeError::EngineLoadFailed {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| MediascribeError::EngineLoadFailed {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        log::info!("loaded whisper model '{}' ({})", model_name, spec.compute);

        Ok(Self {
            context: Mutex::new(context),
            spec,
            model_name,
        })
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
    ///
    /// Whisper expects audio in f32 format normalized to the range [-1.0, 1.0].
    /// Input is 16-bit PCM audio where samples range from -32768 to 32767.
    fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    /// Load stub: always fails, pointing at the missing feature.
    pub fn load(model_path: PathBuf, _spec: EngineSpec) -> Result<Self> {
        let _ = model_name_from_path(&model_path);
        Err(MediascribeError::EngineLoadFailed {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }
}

#[cfg(feature = "whisper")]
impl SpeechEngine for WhisperEngine {
    fn transcribe(&self, samples: &[i16], _batch_size: usize) -> Result<Vec<TranscriptSegment>> {
        let audio_f32 = Self::convert_audio(samples);

        let context = self
            .context
            .lock()
            .map_err(|e| MediascribeError::EngineError {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        let mut state = context
            .create_state()
            .map_err(|e| MediascribeError::EngineError {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        // Deterministic greedy decoding, timestamps off.
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_temperature(0.0);

        if self.spec.auto_language() {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.spec.language));
        }

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio_f32)
            .map_err(|e| MediascribeError::EngineError {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let segments = state
            .as_iter()
            .map(|segment| TranscriptSegment::new(segment.to_string().trim()))
            .collect();

        Ok(segments)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(not(feature = "whisper"))]
impl SpeechEngine for WhisperEngine {
    fn transcribe(&self, _samples: &[i16], _batch_size: usize) -> Result<Vec<TranscriptSegment>> {
        Err(MediascribeError::EngineError {
            message: "Whisper feature not enabled".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
