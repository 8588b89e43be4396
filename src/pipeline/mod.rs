//! Transcription pipeline: events, the per-run state machine and the
//! worker scheduler that hosts runs on dedicated threads.

pub mod event;
pub mod orchestrator;
pub mod worker;

pub use event::{PipelineEvent, ProgressDetail, Stage, TranscriptionResult};
pub use orchestrator::{Orchestrator, RunRequest};
pub use worker::{RunHandle, WorkerScheduler};
