//! External decoder invocation with a hard deadline.
//!
//! Runs ffmpeg to extract mono 16kHz 16-bit PCM WAV audio from a media file.
//! The `MediaDecoder` trait is the seam for tests; `FfmpegDecoder` is the
//! production implementation.

use crate::defaults::{SAMPLE_RATE, STDERR_TAIL_BYTES};
use crate::error::{MediascribeError, Result};
use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Trait for decoding a media file into a WAV artifact.
///
/// Object-safe, Send + Sync for use across worker threads.
/// Enables testability by allowing mock implementations.
pub trait MediaDecoder: Send + Sync {
    /// Decode `source` into a mono 16kHz PCM WAV at `output`.
    ///
    /// Must not spawn anything when `source` does not exist. On any failure
    /// no partial `output` file may remain (best effort).
    fn decode(&self, source: &Path, output: &Path, timeout: Duration) -> Result<()>;
}

/// Production decoder invoking ffmpeg as a subprocess.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    bin: String,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new(crate::defaults::FFMPEG_BIN)
    }
}

impl FfmpegDecoder {
    /// Create a decoder using the given ffmpeg binary (name or path).
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Fixed ffmpeg argument contract: strip video, downmix to mono,
    /// resample to 16kHz, encode s16le PCM in a WAV container, overwrite.
    fn build_args(source: &Path, output: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-i"),
            source.as_os_str().to_os_string(),
            OsString::from("-vn"),
            OsString::from("-ac"),
            OsString::from("1"),
            OsString::from("-ar"),
            OsString::from(SAMPLE_RATE.to_string()),
            OsString::from("-acodec"),
            OsString::from("pcm_s16le"),
            OsString::from("-f"),
            OsString::from("wav"),
            output.as_os_str().to_os_string(),
            OsString::from("-y"),
        ]
    }
}

/// Keep only the trailing portion of captured diagnostics.
///
/// ffmpeg prints banners and stream maps before the actual error; the tail
/// is what identifies the failure.
fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}

fn remove_partial_output(output: &Path) {
    if output.exists()
        && let Err(e) = std::fs::remove_file(output)
    {
        log::warn!(
            "failed to remove partial decoder output {}: {}",
            output.display(),
            e
        );
    }
}

impl MediaDecoder for FfmpegDecoder {
    fn decode(&self, source: &Path, output: &Path, timeout: Duration) -> Result<()> {
        // Precondition: never spawn for a missing source.
        if !source.exists() {
            return Err(MediascribeError::NotFound {
                path: source.to_string_lossy().to_string(),
            });
        }

        log::debug!(
            "decoding {} -> {} (timeout {:?})",
            source.display(),
            output.display(),
            timeout
        );

        let mut child = Command::new(&self.bin)
            .args(Self::build_args(source, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediascribeError::DecodeFailed {
                        detail: format!(
                            "'{}' not found. Install ffmpeg:\n\
                             Ubuntu/Debian: sudo apt install ffmpeg\n\
                             Arch: sudo pacman -S ffmpeg\n\
                             macOS: brew install ffmpeg",
                            self.bin
                        ),
                    }
                } else {
                    MediascribeError::DecodeFailed {
                        detail: format!("failed to spawn '{}': {}", self.bin, e),
                    }
                }
            })?;

        // Drain stderr on its own thread so a chatty decoder cannot fill the
        // pipe and deadlock against our exit polling.
        let mut stderr_pipe = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf);
            }
            buf
        });

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        if let Err(e) = child.kill() {
                            log::warn!("failed to kill timed-out decoder: {}", e);
                        }
                        let _ = child.wait();
                        // Do not join the reader here: a decoder wrapper may
                        // have handed the pipe's write end to children that
                        // outlive the kill, and the buffer is discarded anyway.
                        drop(stderr_reader);
                        remove_partial_output(output);
                        return Err(MediascribeError::DecodeTimeout {
                            seconds: timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    drop(stderr_reader);
                    remove_partial_output(output);
                    return Err(MediascribeError::DecodeFailed {
                        detail: format!("failed to wait on decoder: {}", e),
                    });
                }
            }
        };

        let stderr_buf = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            remove_partial_output(output);
            return Err(MediascribeError::DecodeFailed {
                detail: format!("exit status {:?}: {}", status, stderr_tail(&stderr_buf)),
            });
        }

        // Exit 0 alone is not success: the artifact must exist with content.
        match std::fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(MediascribeError::ArtifactMissing {
                path: output.to_string_lossy().to_string(),
            }),
        }
    }
}

/// Mock decoder for testing.
///
/// Counts invocations and either writes a configurable artifact or fails.
#[derive(Debug)]
pub struct MockDecoder {
    artifact_bytes: Option<Vec<u8>>,
    failure: Option<String>,
    invocations: std::sync::atomic::AtomicUsize,
}

impl Default for MockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDecoder {
    /// Create a mock that writes a minimal placeholder artifact.
    pub fn new() -> Self {
        Self {
            artifact_bytes: Some(b"RIFF mock wav".to_vec()),
            failure: None,
            invocations: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Write these bytes as the decoded artifact.
    pub fn with_artifact_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.artifact_bytes = Some(bytes);
        self
    }

    /// Fail every decode with `DecodeFailed` carrying this detail,
    /// leaving no artifact behind.
    pub fn with_failure(mut self, detail: &str) -> Self {
        self.failure = Some(detail.to_string());
        self.artifact_bytes = None;
        self
    }

    /// Exit zero but write nothing, triggering `ArtifactMissing`.
    pub fn with_missing_artifact(mut self) -> Self {
        self.failure = None;
        self.artifact_bytes = None;
        self
    }

    /// Number of decode calls so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl MediaDecoder for MockDecoder {
    fn decode(&self, source: &Path, output: &Path, _timeout: Duration) -> Result<()> {
        if !source.exists() {
            return Err(MediascribeError::NotFound {
                path: source.to_string_lossy().to_string(),
            });
        }
        self.invocations
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(detail) = &self.failure {
            return Err(MediascribeError::DecodeFailed {
                detail: detail.clone(),
            });
        }
        match &self.artifact_bytes {
            Some(bytes) => {
                std::fs::write(output, bytes)?;
                Ok(())
            }
            None => Err(MediascribeError::ArtifactMissing {
                path: output.to_string_lossy().to_string(),
            }),
        }
    }
}
