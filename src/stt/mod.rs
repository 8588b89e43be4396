//! Speech-to-text: engine trait, compute selection, Whisper backend and the
//! lifecycle adapter that owns the loaded model.

pub mod adapter;
pub mod compute;
pub mod engine;
pub mod whisper;

pub use adapter::{EngineLoader, InferenceEngine, MockLoader, WhisperLoader};
pub use compute::{Compute, Device, DeviceCapabilities, Precision, select_compute};
pub use engine::{EngineSpec, MockEngine, SpeechEngine, TranscriptSegment};
pub use whisper::WhisperEngine;
