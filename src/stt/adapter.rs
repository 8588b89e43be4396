//! Engine lifecycle adapter.
//!
//! `InferenceEngine` owns at most one loaded engine handle at a time. Loading
//! is idempotent for an unchanged spec, a changed spec tears the old handle
//! down first, and `unload` is safe to call repeatedly. The adapter also
//! turns a WAV artifact on disk into the sample buffer the engine consumes.

use crate::error::{MediascribeError, Result};
use crate::models;
use crate::stt::engine::{EngineSpec, MockEngine, SpeechEngine, TranscriptSegment};
use crate::stt::whisper::WhisperEngine;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Trait for constructing a loaded engine from a spec.
///
/// The production loader resolves the model file and builds a Whisper
/// engine; tests substitute a mock that counts loads.
pub trait EngineLoader: Send {
    fn load(&self, spec: &EngineSpec) -> Result<Box<dyn SpeechEngine>>;
}

/// Production loader: model catalog lookup + Whisper.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhisperLoader;

impl EngineLoader for WhisperLoader {
    fn load(&self, spec: &EngineSpec) -> Result<Box<dyn SpeechEngine>> {
        let model_path = models::installed_path(spec.tier).ok_or_else(|| {
            MediascribeError::EngineLoadFailed {
                message: format!(
                    "model '{}' is not installed (looked for {} under {})",
                    spec.tier,
                    spec.tier.file_name(),
                    models::search_dirs()
                        .iter()
                        .map(|d| d.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        })?;
        let engine = WhisperEngine::load(model_path, spec.clone())?;
        Ok(Box::new(engine))
    }
}

/// Mock loader for testing: returns a configurable MockEngine and counts
/// how many times a load actually happened.
#[derive(Debug, Clone)]
pub struct MockLoader {
    segments: Vec<String>,
    fail_load: bool,
    fail_transcribe: bool,
    loads: Arc<AtomicUsize>,
}

impl Default for MockLoader {
    fn default() -> Self {
        Self::new(&["mock transcription"])
    }
}

impl MockLoader {
    pub fn new(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            fail_load: false,
            fail_transcribe: false,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every load with `EngineLoadFailed`.
    pub fn with_load_failure(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Load fine, but fail every transcribe call.
    pub fn with_transcribe_failure(mut self) -> Self {
        self.fail_transcribe = true;
        self
    }

    /// Number of successful loads performed.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl EngineLoader for MockLoader {
    fn load(&self, spec: &EngineSpec) -> Result<Box<dyn SpeechEngine>> {
        if self.fail_load {
            return Err(MediascribeError::EngineLoadFailed {
                message: "mock load failure".to_string(),
            });
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        let name = format!("mock-{}", spec.tier);
        let refs: Vec<&str> = self.segments.iter().map(|s| s.as_str()).collect();
        let mut engine = MockEngine::new(&name).with_segments(&refs);
        if self.fail_transcribe {
            engine = engine.with_failure();
        }
        Ok(Box::new(engine))
    }
}

struct EngineHandle {
    spec: EngineSpec,
    engine: Box<dyn SpeechEngine>,
}

/// Owns the lazily-loaded, swappable engine handle.
pub struct InferenceEngine {
    loader: Box<dyn EngineLoader>,
    handle: Option<EngineHandle>,
}

impl InferenceEngine {
    pub fn new(loader: Box<dyn EngineLoader>) -> Self {
        Self {
            loader,
            handle: None,
        }
    }

    /// True if an engine with exactly this configuration is loaded.
    pub fn is_resident(&self, spec: &EngineSpec) -> bool {
        self.handle.as_ref().is_some_and(|h| &h.spec == spec)
    }

    /// Load the engine for `spec`.
    ///
    /// No-op if an identically configured engine is already resident.
    /// A different resident configuration is unloaded first, then the
    /// requested one is loaded.
    pub fn load(&mut self, spec: &EngineSpec) -> Result<()> {
        if self.is_resident(spec) {
            log::debug!("engine for {} already resident, reusing", spec.tier);
            return Ok(());
        }
        if let Some(old) = self.handle.take() {
            log::info!(
                "unloading engine '{}' for configuration change",
                old.engine.model_name()
            );
            drop(old);
        }
        let engine = self.loader.load(spec)?;
        self.handle = Some(EngineHandle {
            spec: spec.clone(),
            engine,
        });
        Ok(())
    }

    /// Transcribe the WAV artifact at `path`.
    ///
    /// Requires a loaded engine and a readable, nonempty artifact. Returns
    /// the ordered segments and elapsed wall-clock time of the inference call.
    pub fn transcribe(
        &mut self,
        path: &Path,
        batch_size: usize,
    ) -> Result<(Vec<TranscriptSegment>, Duration)> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| MediascribeError::EngineError {
                message: "transcribe called with no engine loaded".to_string(),
            })?;

        let samples = read_artifact(path)?;

        let started = Instant::now();
        let segments = handle.engine.transcribe(&samples, batch_size)?;
        let elapsed = started.elapsed();

        log::debug!(
            "transcribed {} samples into {} segments in {:.2}s",
            samples.len(),
            segments.len(),
            elapsed.as_secs_f64()
        );

        Ok((segments, elapsed))
    }

    /// Release engine memory. Safe to call any number of times.
    pub fn unload(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::info!("unloading engine '{}'", handle.engine.model_name());
        }
    }

    /// Name of the resident model, if any.
    pub fn model_name(&self) -> Option<&str> {
        self.handle.as_ref().map(|h| h.engine.model_name())
    }
}

/// Read a decoded artifact into 16-bit PCM samples.
///
/// The decoder contract guarantees mono 16kHz s16le; anything else means the
/// artifact is unusable, not that we should fix it up here.
fn read_artifact(path: &Path) -> Result<Vec<i16>> {
    let len = std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| MediascribeError::InvalidAudio {
            message: format!("cannot read artifact {}: {}", path.display(), e),
        })?;
    if len == 0 {
        return Err(MediascribeError::InvalidAudio {
            message: format!("artifact {} is empty", path.display()),
        });
    }

    let mut reader = hound::WavReader::open(path).map_err(|e| MediascribeError::InvalidAudio {
        message: format!("failed to parse WAV artifact: {}", e),
    })?;

    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != crate::defaults::SAMPLE_RATE {
        return Err(MediascribeError::InvalidAudio {
            message: format!(
                "artifact format mismatch: expected mono {}Hz, got {}ch {}Hz",
                crate::defaults::SAMPLE_RATE,
                spec.channels,
                spec.sample_rate
            ),
        });
    }

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| MediascribeError::InvalidAudio {
            message: format!("failed to read WAV samples: {}", e),
        })?;

    if samples.is_empty() {
        return Err(MediascribeError::InvalidAudio {
            message: format!("artifact {} contains no samples", path.display()),
        });
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::ModelTier;
    use crate::stt::compute::{DeviceCapabilities, select_compute};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn spec(tier: ModelTier) -> EngineSpec {
        EngineSpec::new(
            tier,
            "en",
            select_compute(&DeviceCapabilities { accelerator: false }),
        )
    }

    /// Serialize a valid mono 16kHz WAV for artifact fixtures.
    pub(crate) fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: crate::defaults::SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn write_artifact(dir: &Path, samples: &[i16]) -> std::path::PathBuf {
        let path = dir.join("artifact.wav");
        std::fs::write(&path, wav_bytes(samples)).unwrap();
        path
    }

    #[test]
    fn load_is_idempotent_for_same_spec() {
        let loader = MockLoader::default();
        let mut engine = InferenceEngine::new(Box::new(loader.clone()));

        engine.load(&spec(ModelTier::Base)).unwrap();
        engine.load(&spec(ModelTier::Base)).unwrap();
        engine.load(&spec(ModelTier::Base)).unwrap();

        assert_eq!(loader.loads(), 1);
        assert!(engine.is_resident(&spec(ModelTier::Base)));
    }

    #[test]
    fn changed_spec_unloads_then_reloads() {
        let loader = MockLoader::default();
        let mut engine = InferenceEngine::new(Box::new(loader.clone()));

        engine.load(&spec(ModelTier::Base)).unwrap();
        engine.load(&spec(ModelTier::Small)).unwrap();

        assert_eq!(loader.loads(), 2);
        assert!(engine.is_resident(&spec(ModelTier::Small)));
        assert!(!engine.is_resident(&spec(ModelTier::Base)));
    }

    #[test]
    fn unload_twice_is_a_noop_both_times() {
        let loader = MockLoader::default();
        let mut engine = InferenceEngine::new(Box::new(loader.clone()));
        engine.load(&spec(ModelTier::Base)).unwrap();

        engine.unload();
        assert!(!engine.is_resident(&spec(ModelTier::Base)));
        engine.unload();
        assert!(engine.model_name().is_none());
    }

    #[test]
    fn load_failure_leaves_no_handle() {
        let loader = MockLoader::default().with_load_failure();
        let mut engine = InferenceEngine::new(Box::new(loader));
        let err = engine.load(&spec(ModelTier::Base)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineLoadFailed);
        assert!(engine.model_name().is_none());
    }

    #[test]
    fn transcribe_without_engine_fails() {
        let dir = tempdir().unwrap();
        let path = write_artifact(dir.path(), &[0i16; 160]);
        let mut engine = InferenceEngine::new(Box::new(MockLoader::default()));
        let err = engine.transcribe(&path, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineError);
    }

    #[test]
    fn transcribe_returns_segments_and_elapsed_time() {
        let dir = tempdir().unwrap();
        let path = write_artifact(dir.path(), &[100i16; 1600]);
        let loader = MockLoader::new(&["hello world"]);
        let mut engine = InferenceEngine::new(Box::new(loader));
        engine.load(&spec(ModelTier::Base)).unwrap();

        let (segments, _elapsed) = engine.transcribe(&path, 16).unwrap();
        assert_eq!(segments, vec![TranscriptSegment::new("hello world")]);
    }

    #[test]
    fn empty_artifact_is_invalid_audio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        let mut engine = InferenceEngine::new(Box::new(MockLoader::default()));
        engine.load(&spec(ModelTier::Base)).unwrap();
        let err = engine.transcribe(&path, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAudio);
    }

    #[test]
    fn garbage_artifact_is_invalid_audio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"not a wav file at all").unwrap();

        let mut engine = InferenceEngine::new(Box::new(MockLoader::default()));
        engine.load(&spec(ModelTier::Base)).unwrap();
        let err = engine.transcribe(&path, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAudio);
    }

    #[test]
    fn missing_artifact_is_invalid_audio() {
        let mut engine = InferenceEngine::new(Box::new(MockLoader::default()));
        engine.load(&spec(ModelTier::Base)).unwrap();
        let err = engine
            .transcribe(Path::new("/no/such/artifact.wav"), 16)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAudio);
    }

    #[test]
    fn wrong_format_artifact_is_invalid_audio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec_441 = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec_441).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let mut engine = InferenceEngine::new(Box::new(MockLoader::default()));
        engine.load(&spec(ModelTier::Base)).unwrap();
        let err = engine.transcribe(&path, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAudio);
        assert!(err.to_string().contains("format mismatch"));
    }

    #[test]
    fn whisper_loader_fails_cleanly_when_model_not_installed() {
        // Uses a tier nobody installs in CI; the message should name it.
        let loader = WhisperLoader;
        let result = loader.load(&spec(ModelTier::Large));
        if let Err(MediascribeError::EngineLoadFailed { message }) = &result {
            assert!(message.contains("large") || message.contains("Whisper"));
        }
        // With a model actually installed this may succeed; both are fine.
    }
}
