//! Application entry point: compose the pipeline and drive one run.
//!
//! Builds the production scheduler (ffmpeg decoder + Whisper loader),
//! submits the requested file and drains events to the terminal. Ctrl-C
//! flips the cancellation flag; the run then stops at the next stage
//! boundary and confirms with a `Cancelled` event.

use crate::config::Config;
use crate::decode::FfmpegDecoder;
use crate::error::ErrorKind;
use crate::pipeline::event::PipelineEvent;
use crate::pipeline::orchestrator::RunRequest;
use crate::pipeline::worker::WorkerScheduler;
use crate::stt::adapter::WhisperLoader;
use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_signal: libc::c_int) {
    SIGINT_RECEIVED.store(true, Ordering::SeqCst);
}

/// Route SIGINT into the cooperative cancellation flag.
fn install_sigint_handler() {
    let handler = handle_sigint as extern "C" fn(libc::c_int);
    // SAFETY: installing a signal handler that only touches an AtomicBool.
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
}

/// Transcribe one file with the effective configuration.
///
/// Blocks until the run delivers its terminal event. Returns an error for
/// `Failed` runs; cancellation is a normal, quiet exit.
pub fn run_transcribe(config: &Config, input: PathBuf, quiet: bool) -> Result<()> {
    config.validate()?;

    let scheduler = WorkerScheduler::new(
        Arc::new(FfmpegDecoder::new(config.decode.ffmpeg.clone())),
        Box::new(WhisperLoader),
    );

    let request = RunRequest::from_config(input, config);
    let handle = scheduler.submit(request)?;

    install_sigint_handler();

    let mut stop_requested = false;
    let terminal = loop {
        if SIGINT_RECEIVED.load(Ordering::SeqCst) && !stop_requested {
            stop_requested = true;
            handle.stop();
            if !quiet {
                eprintln!(
                    "{}",
                    "mediascribe: cancelling after the current stage...".yellow()
                );
            }
        }

        match handle.events().recv_timeout(Duration::from_millis(100)) {
            Ok(PipelineEvent::Progress { stage, detail }) => {
                if !quiet {
                    eprintln!("{} {}", format!("[{}]", stage).cyan(), detail);
                }
            }
            Ok(event) => break event,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                handle.join();
                bail!("worker exited without a terminal event");
            }
        }
    };

    handle.join();
    scheduler.shutdown();

    match terminal {
        PipelineEvent::Completed(result) => {
            if !quiet {
                eprintln!(
                    "{} {} words in {:.2}s",
                    "done:".green().bold(),
                    result.word_count,
                    result.processing_time.as_secs_f64()
                );
            }
            println!("{}", result.output_file.display());
            Ok(())
        }
        PipelineEvent::Cancelled => {
            if !quiet {
                eprintln!("{}", "cancelled".yellow());
            }
            Ok(())
        }
        PipelineEvent::Failed { kind, message } => {
            if kind == ErrorKind::EngineLoadFailed {
                eprintln!("Hint: run `mediascribe models` to see installed models.");
            }
            bail!("{}: {}", kind, message)
        }
        PipelineEvent::Progress { .. } => unreachable!("loop breaks only on terminal events"),
    }
}
