//! Encode sequencing: ordered frames and the concat manifest.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::RenderResult;

/// One frame reference with its display duration in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEntry {
    pub path: PathBuf,
    pub duration: f64,
}

/// The ordered list of (frame, duration) pairs handed to the encoder.
///
/// Frames are appended in word-group order and the manifest preserves that
/// order exactly, so the output video's word order matches the input text.
#[derive(Debug, Clone, Default)]
pub struct FrameSequence {
    entries: Vec<FrameEntry>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<PathBuf>, duration: f64) {
        self.entries.push(FrameEntry {
            path: path.into(),
            duration,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    /// Sum of per-frame durations: the nominal runtime of the output.
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.duration).sum()
    }

    /// Serialize the concat-demuxer manifest.
    ///
    /// The final frame's `file` line is repeated without a duration;
    /// concat-based encoders otherwise truncate the last frame's visible
    /// duration to zero.
    pub fn to_concat_manifest(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            writeln!(out, "file '{}'", entry.path.display()).expect("string write");
            writeln!(out, "duration {}", entry.duration).expect("string write");
        }
        if let Some(last) = self.entries.last() {
            writeln!(out, "file '{}'", last.path.display()).expect("string write");
        }
        out
    }

    /// Write the manifest next to the frames.
    pub async fn write_concat_manifest(&self, path: &Path) -> RenderResult<()> {
        tokio::fs::write(path, self.to_concat_manifest()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> FrameSequence {
        let mut seq = FrameSequence::new();
        seq.push("/tmp/j/frames/frame_000000.png", 0.5);
        seq.push("/tmp/j/frames/frame_000001.png", 0.2);
        seq.push("/tmp/j/frames/frame_000002.png", 0.3);
        seq
    }

    #[test]
    fn test_total_duration_matches_timing_sum() {
        assert!((sequence().total_duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_manifest_repeats_final_frame() {
        let manifest = sequence().to_concat_manifest();
        let lines: Vec<&str> = manifest.lines().collect();

        // Three file/duration pairs plus the trailing repeat.
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "file '/tmp/j/frames/frame_000000.png'");
        assert_eq!(lines[1], "duration 0.5");
        assert_eq!(lines[6], "file '/tmp/j/frames/frame_000002.png'");
        assert!(!lines[6].starts_with("duration"));
    }

    #[test]
    fn test_empty_sequence_has_no_trailing_repeat() {
        assert_eq!(FrameSequence::new().to_concat_manifest(), "");
    }

    #[test]
    fn test_durations_not_perturbed() {
        let mut seq = FrameSequence::new();
        seq.push("/tmp/f.png", 0.15000000000000002);
        let manifest = seq.to_concat_manifest();
        assert!(manifest.contains("duration 0.15000000000000002"));
    }

    #[tokio::test]
    async fn test_write_concat_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concat.txt");
        sequence().write_concat_manifest(&path).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, sequence().to_concat_manifest());
    }
}
