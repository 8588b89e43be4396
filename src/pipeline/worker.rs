//! Worker scheduling: one dedicated thread per run.
//!
//! The scheduler owns the shared inference engine and the decoder. Each
//! submitted run gets its own worker thread, event channel and cancellation
//! flag; the consumer drains events without ever blocking the worker.

use crate::decode::MediaDecoder;
use crate::defaults::EVENT_BUFFER;
use crate::error::Result;
use crate::pipeline::event::PipelineEvent;
use crate::pipeline::orchestrator::{Orchestrator, RunRequest};
use crate::stt::adapter::{EngineLoader, InferenceEngine};
use crossbeam_channel::{Receiver, bounded};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Spawns and tracks transcription runs.
///
/// The engine handle lives here, shared by all runs, so consecutive runs
/// with an unchanged configuration reuse the loaded model. `shutdown`
/// releases it; dropping the scheduler does the same.
pub struct WorkerScheduler {
    decoder: Arc<dyn MediaDecoder>,
    engine: Arc<Mutex<InferenceEngine>>,
    run_seq: AtomicU64,
}

impl WorkerScheduler {
    pub fn new(decoder: Arc<dyn MediaDecoder>, loader: Box<dyn EngineLoader>) -> Self {
        Self {
            decoder,
            engine: Arc::new(Mutex::new(InferenceEngine::new(loader))),
            run_seq: AtomicU64::new(0),
        }
    }

    /// Start a run on its own worker thread.
    ///
    /// Returns a handle carrying the event receiver and the cancellation
    /// switch. Exactly one terminal event will arrive on the receiver.
    pub fn submit(&self, request: RunRequest) -> Result<RunHandle> {
        let (tx, rx) = bounded(EVENT_BUFFER);
        let cancel = Arc::new(AtomicBool::new(false));
        let orchestrator = Orchestrator::new(
            self.decoder.clone(),
            self.engine.clone(),
            tx,
            cancel.clone(),
        );

        let seq = self.run_seq.fetch_add(1, Ordering::Relaxed);
        let thread = std::thread::Builder::new()
            .name(format!("mediascribe-run-{}", seq))
            .spawn(move || orchestrator.run(request))?;

        Ok(RunHandle {
            events: rx,
            cancel,
            thread: Some(thread),
        })
    }

    /// Release the shared engine handle.
    ///
    /// Called automatically on drop; calling it again is a no-op. Waits for
    /// the engine lock, so it runs after any in-flight transcribe finishes.
    pub fn shutdown(&self) {
        match self.engine.lock() {
            Ok(mut engine) => engine.unload(),
            Err(poisoned) => poisoned.into_inner().unload(),
        }
    }
}

impl Drop for WorkerScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to one submitted run.
pub struct RunHandle {
    events: Receiver<PipelineEvent>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Receiver for this run's events.
    pub fn events(&self) -> &Receiver<PipelineEvent> {
        &self.events
    }

    /// Request cooperative cancellation and return immediately.
    ///
    /// Termination is confirmed by the `Cancelled` terminal event, never by
    /// this call: a stage already in flight runs to completion first.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Wait for the worker thread to finish, reporting panics to stderr.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take()
            && let Err(panic_info) = thread.join()
        {
            let msg = panic_info
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic");
            eprintln!("mediascribe: worker thread panicked: {msg}");
        }
    }
}
