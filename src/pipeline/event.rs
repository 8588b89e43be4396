//! Event and result types for the transcription pipeline.

use crate::error::ErrorKind;
use crate::stt::engine::TranscriptSegment;
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline stages, in execution order, plus the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Decoding,
    ModelLoading,
    Transcribing,
    Persisting,
    Completed,
    Failed,
    Cancelled,
}

impl Stage {
    /// Label used in progress events and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::Decoding => "decoding",
            Stage::ModelLoading => "loading model",
            Stage::Transcribing => "transcribing",
            Stage::Persisting => "saving transcript",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
            Stage::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed | Stage::Cancelled)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Either a completion percentage or a free-form status message.
///
/// Consumers must tolerate missing intermediate percentages; progress is
/// informational, never load-bearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressDetail {
    Percent(u8),
    Message(String),
}

impl std::fmt::Display for ProgressDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressDetail::Percent(p) => write!(f, "{}%", p),
            ProgressDetail::Message(m) => write!(f, "{}", m),
        }
    }
}

/// Aggregate outcome of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResult {
    /// Ordered segments as emitted by the engine.
    pub segments: Vec<TranscriptSegment>,
    /// Sum of whitespace-delimited tokens across all segment texts.
    pub word_count: usize,
    /// Wall-clock duration of the inference call.
    pub processing_time: Duration,
    /// All segment texts joined with single spaces.
    pub full_text: String,
    /// Path of the persisted transcript.
    pub output_file: PathBuf,
}

impl TranscriptionResult {
    /// Build the aggregate from raw segments, computing the derived fields.
    pub fn from_segments(
        segments: Vec<TranscriptSegment>,
        processing_time: Duration,
        output_file: PathBuf,
    ) -> Self {
        let word_count = segments
            .iter()
            .map(|s| s.text.split_whitespace().count())
            .sum();
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            segments,
            word_count,
            processing_time,
            full_text,
            output_file,
        }
    }
}

/// Events a run delivers to its consumer.
///
/// Exactly one terminal event (`Completed`, `Failed` or `Cancelled`) is sent
/// per run, after any number of `Progress` events. Cancellation is never
/// reported as a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Progress {
        stage: Stage,
        detail: ProgressDetail,
    },
    Completed(TranscriptionResult),
    Failed {
        kind: ErrorKind,
        message: String,
    },
    Cancelled,
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineEvent::Progress { .. })
    }
}
