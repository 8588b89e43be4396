//! Temporary audio artifact ownership.
//!
//! The decoded WAV file is private to one pipeline run and must be removed
//! exactly once no matter how the run ends. Deletion rides on `Drop`, so
//! success, failure, cancellation and panics all take the same path.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Owning guard for the temporary decoded WAV file.
///
/// Allocating picks a collision-free path; the file itself is created by the
/// decoder. Dropping the guard removes the file best-effort if it exists.
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
}

impl AudioArtifact {
    /// Allocate a unique artifact path in `dir` for the given source file.
    ///
    /// The name combines the source stem, a local timestamp, the process id
    /// and a process-wide counter, so concurrent runs on the same source
    /// never collide.
    pub fn allocate(source: &Path, dir: &Path) -> Self {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("media");
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}_{}_{}-{}.wav", stem, stamp, std::process::id(), seq);
        Self {
            path: dir.join(name),
        }
    }

    /// Allocate under the system temp directory.
    pub fn allocate_in_temp(source: &Path) -> Self {
        Self::allocate(source, &std::env::temp_dir())
    }

    /// Path the decoder should write to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if self.path.exists()
            && let Err(e) = std::fs::remove_file(&self.path)
        {
            log::warn!(
                "failed to remove temp audio artifact {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn allocate_uses_source_stem_and_wav_extension() {
        let dir = tempdir().unwrap();
        let artifact = AudioArtifact::allocate(Path::new("/videos/sample.mp4"), dir.path());
        let name = artifact.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("sample_"));
        assert!(name.ends_with(".wav"));
    }

    #[test]
    fn allocations_never_collide() {
        let dir = tempdir().unwrap();
        let a = AudioArtifact::allocate(Path::new("clip.mp4"), dir.path());
        let b = AudioArtifact::allocate(Path::new("clip.mp4"), dir.path());
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn drop_removes_existing_file() {
        let dir = tempdir().unwrap();
        let artifact = AudioArtifact::allocate(Path::new("clip.mp4"), dir.path());
        std::fs::write(artifact.path(), b"RIFF").unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn drop_is_quiet_when_decoder_never_wrote() {
        let dir = tempdir().unwrap();
        let artifact = AudioArtifact::allocate(Path::new("clip.mp4"), dir.path());
        assert!(!artifact.path().exists());
        drop(artifact); // must not panic
    }
}
