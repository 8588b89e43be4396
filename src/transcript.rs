//! Transcript persistence.
//!
//! Writes ordered segments to a deterministically named UTF-8 text file,
//! one segment per line: `{dir}/{stem}_transcript_{YYYYMMDD_HHMMSS}.txt`.

use crate::error::Result;
use crate::stt::engine::TranscriptSegment;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persists transcripts. Stateless; the file system is the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptStore;

impl TranscriptStore {
    /// Write `segments` for `source` under `output_dir`, creating the
    /// directory if absent. Returns the path of the written file.
    ///
    /// Format: plain UTF-8, one segment's text per line in segment order,
    /// each line terminated with a newline, no header or metadata.
    pub fn persist(
        &self,
        segments: &[TranscriptSegment],
        source: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("media");
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = output_dir.join(format!("{}_transcript_{}.txt", stem, stamp));

        let mut file = std::fs::File::create(&path)?;
        for segment in segments {
            file.write_all(segment.text.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.flush()?;

        log::info!(
            "wrote {} segments to {}",
            segments.len(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, MediascribeError};
    use tempfile::tempdir;

    fn segments(texts: &[&str]) -> Vec<TranscriptSegment> {
        texts.iter().map(|t| TranscriptSegment::new(*t)).collect()
    }

    #[test]
    fn persist_writes_one_line_per_segment() {
        let dir = tempdir().unwrap();
        let path = TranscriptStore
            .persist(
                &segments(&["hello world", "second segment"]),
                Path::new("/videos/sample.mp4"),
                dir.path(),
            )
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hello world\nsecond segment\n");
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn persist_derives_name_from_source_stem() {
        let dir = tempdir().unwrap();
        let path = TranscriptStore
            .persist(&segments(&["x"]), Path::new("clip.mkv"), dir.path())
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("clip_transcript_"));
        assert!(name.ends_with(".txt"));
        // Timestamp component: YYYYMMDD_HHMMSS
        let stamp = name
            .strip_prefix("clip_transcript_")
            .unwrap()
            .strip_suffix(".txt")
            .unwrap();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.chars().filter(|c| *c == '_').count(), 1);
    }

    #[test]
    fn persist_creates_missing_output_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = TranscriptStore
            .persist(&segments(&["x"]), Path::new("clip.mp4"), &nested)
            .unwrap();
        assert!(path.exists());
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn persist_empty_segments_writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = TranscriptStore
            .persist(&[], Path::new("clip.mp4"), dir.path())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn persist_preserves_utf8() {
        let dir = tempdir().unwrap();
        let path = TranscriptStore
            .persist(&segments(&["größe naïve 日本語"]), Path::new("c.mp4"), dir.path())
            .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "größe naïve 日本語\n");
    }

    #[cfg(unix)]
    #[test]
    fn persist_surfaces_io_errors() {
        use std::os::unix::fs::PermissionsExt;

        // Directory permissions are not enforced for root.
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let dir = tempdir().unwrap();
        let readonly = dir.path().join("ro");
        std::fs::create_dir(&readonly).unwrap();
        std::fs::set_permissions(&readonly, std::fs::Permissions::from_mode(0o555)).unwrap();

        let result = TranscriptStore.persist(&segments(&["x"]), Path::new("c.mp4"), &readonly);
        match result {
            Err(e @ MediascribeError::Io(_)) => assert_eq!(e.kind(), ErrorKind::IoError),
            other => panic!("expected Io error, got {:?}", other),
        }

        std::fs::set_permissions(&readonly, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
