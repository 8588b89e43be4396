//! The pipeline state machine for one transcription run.
//!
//! Sequences decode → model-load → inference → persist on the caller's
//! thread, emitting progress events and exactly one terminal event. The
//! cancellation flag is observed only at stage boundaries; an in-flight
//! decoder process or inference call always runs to completion.

use crate::artifact::AudioArtifact;
use crate::config::Config;
use crate::decode::MediaDecoder;
use crate::error::MediascribeError;
use crate::pipeline::event::{PipelineEvent, ProgressDetail, Stage, TranscriptionResult};
use crate::stt::adapter::InferenceEngine;
use crate::stt::compute::{DeviceCapabilities, select_compute};
use crate::stt::engine::EngineSpec;
use crate::transcript::TranscriptStore;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub engine_spec: EngineSpec,
    pub batch_size: usize,
    pub decode_timeout: Duration,
}

impl RunRequest {
    /// Build a request from the effective configuration, selecting compute
    /// from the detected device capabilities.
    pub fn from_config(source: PathBuf, config: &Config) -> Self {
        let compute = select_compute(&DeviceCapabilities::detect());
        Self {
            source,
            output_dir: config.output.dir.clone(),
            engine_spec: EngineSpec::new(config.stt.model, config.stt.language.clone(), compute),
            batch_size: config.stt.batch_size,
            decode_timeout: Duration::from_secs(config.decode.timeout_secs),
        }
    }
}

/// How a run ended, before it becomes the terminal event.
enum RunAbort {
    Cancelled,
    Failed(MediascribeError),
}

impl From<MediascribeError> for RunAbort {
    fn from(e: MediascribeError) -> Self {
        RunAbort::Failed(e)
    }
}

/// Drives one run through the pipeline stages.
pub struct Orchestrator {
    decoder: Arc<dyn MediaDecoder>,
    engine: Arc<Mutex<InferenceEngine>>,
    store: TranscriptStore,
    events: Sender<PipelineEvent>,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        decoder: Arc<dyn MediaDecoder>,
        engine: Arc<Mutex<InferenceEngine>>,
        events: Sender<PipelineEvent>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            decoder,
            engine,
            store: TranscriptStore,
            events,
            cancel,
        }
    }

    /// Execute the run and deliver its single terminal event.
    pub fn run(self, request: RunRequest) {
        let terminal = match self.execute(&request) {
            Ok(result) => {
                log::info!(
                    "run completed: {} words in {:.2}s -> {}",
                    result.word_count,
                    result.processing_time.as_secs_f64(),
                    result.output_file.display()
                );
                PipelineEvent::Completed(result)
            }
            Err(RunAbort::Cancelled) => {
                log::info!("run cancelled: {}", request.source.display());
                PipelineEvent::Cancelled
            }
            Err(RunAbort::Failed(e)) => {
                log::warn!("run failed ({}): {}", e.kind(), e);
                PipelineEvent::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };
        // The terminal event must not be dropped; block if the channel is
        // momentarily full. A vanished consumer is the only acceptable loss.
        if self.events.send(terminal).is_err() {
            log::debug!("consumer disconnected before terminal event delivery");
        }
    }

    fn execute(&self, request: &RunRequest) -> Result<TranscriptionResult, RunAbort> {
        log::debug!("run pending: {}", request.source.display());
        self.checkpoint(Stage::Pending)?;

        // Decoding. The artifact guard is dropped on every path out of this
        // function, which removes the file exactly once.
        self.progress(
            Stage::Decoding,
            ProgressDetail::Message(format!(
                "extracting audio from {}",
                request
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| request.source.display().to_string())
            )),
        );
        let artifact = AudioArtifact::allocate_in_temp(&request.source);
        self.decoder
            .decode(&request.source, artifact.path(), request.decode_timeout)?;
        self.progress(Stage::Decoding, ProgressDetail::Percent(100));
        self.checkpoint(Stage::Decoding)?;

        // Serialize all engine access: the lock is held from (possible) load
        // through transcribe, so one handle never sees two concurrent runs.
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| MediascribeError::EngineError {
                message: "engine lock poisoned by a previous run".to_string(),
            })?;

        if !engine.is_resident(&request.engine_spec) {
            self.progress(
                Stage::ModelLoading,
                ProgressDetail::Message(format!("loading {} model", request.engine_spec.tier)),
            );
            engine.load(&request.engine_spec)?;
        }
        self.checkpoint(Stage::ModelLoading)?;

        self.progress(
            Stage::Transcribing,
            ProgressDetail::Message("running inference".to_string()),
        );
        let (segments, processing_time) =
            engine.transcribe(artifact.path(), request.batch_size)?;
        drop(engine);
        self.checkpoint(Stage::Transcribing)?;

        self.progress(
            Stage::Persisting,
            ProgressDetail::Message("saving transcript".to_string()),
        );
        let output_file = self
            .store
            .persist(&segments, &request.source, &request.output_dir)?;

        Ok(TranscriptionResult::from_segments(
            segments,
            processing_time,
            output_file,
        ))
    }

    /// Stage-boundary cancellation check.
    fn checkpoint(&self, after: Stage) -> Result<(), RunAbort> {
        if self.cancel.load(Ordering::SeqCst) {
            log::debug!("cancellation observed after {} stage", after);
            Err(RunAbort::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Best-effort progress emission: never blocks the run, and a full or
    /// disconnected channel just loses an intermediate update.
    fn progress(&self, stage: Stage, detail: ProgressDetail) {
        log::debug!("stage {}: {}", stage, detail);
        let _ = self
            .events
            .try_send(PipelineEvent::Progress { stage, detail });
    }
}
