use crate::defaults;
use crate::error::{MediascribeError, Result};
use crate::models::ModelTier;
use crate::stt::compute::Compute;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One contiguous unit of recognized text, in engine emission order.
///
/// Timestamps are disabled by configuration, so text is all a segment carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Full configuration of one loaded engine instance.
///
/// Two specs comparing equal means a resident engine can be reused as-is;
/// any difference forces an unload and reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSpec {
    pub tier: ModelTier,
    pub language: String,
    pub compute: Compute,
}

impl EngineSpec {
    pub fn new(tier: ModelTier, language: impl Into<String>, compute: Compute) -> Self {
        Self {
            tier,
            language: language.into(),
            compute,
        }
    }

    /// True when the language should be auto-detected.
    pub fn auto_language(&self) -> bool {
        self.language == defaults::AUTO_LANGUAGE
    }
}

/// Trait for a loaded speech-recognition engine.
///
/// This trait allows swapping implementations (real Whisper vs mock).
pub trait SpeechEngine: Send {
    /// Transcribe mono 16kHz 16-bit PCM samples into ordered segments.
    ///
    /// `batch_size` is advisory; a backend that decodes sequentially may
    /// ignore it.
    fn transcribe(&self, samples: &[i16], batch_size: usize) -> Result<Vec<TranscriptSegment>>;

    /// Name of the loaded model.
    fn model_name(&self) -> &str;
}

/// Mock engine for testing.
///
/// Returns a fixed segment sequence and records the calls it receives.
#[derive(Debug)]
pub struct MockEngine {
    model_name: String,
    segments: Vec<TranscriptSegment>,
    should_fail: bool,
    calls: AtomicUsize,
    last_batch_size: Mutex<Option<usize>>,
}

impl MockEngine {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            segments: vec![TranscriptSegment::new("mock transcription")],
            should_fail: false,
            calls: AtomicUsize::new(0),
            last_batch_size: Mutex::new(None),
        }
    }

    /// Configure the segments every transcribe call returns.
    pub fn with_segments(mut self, texts: &[&str]) -> Self {
        self.segments = texts.iter().map(|t| TranscriptSegment::new(*t)).collect();
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_batch_size(&self) -> Option<usize> {
        *self.last_batch_size.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SpeechEngine for MockEngine {
    fn transcribe(&self, _samples: &[i16], batch_size: usize) -> Result<Vec<TranscriptSegment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_batch_size.lock() {
            *last = Some(batch_size);
        }
        if self.should_fail {
            Err(MediascribeError::EngineError {
                message: "mock inference failure".to_string(),
            })
        } else {
            Ok(self.segments.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
