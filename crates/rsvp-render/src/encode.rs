//! FFmpeg invocation for the concat encode.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{RenderError, RenderResult};

/// How many trailing diagnostic lines are kept for failure messages.
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// Interval at which an in-flight encode checks for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Encodes a frame sequence into a single H.264 video.
///
/// The encoder consumes the concat manifest produced by
/// [`crate::manifest::FrameSequence`] and honors each frame's duration at a
/// fixed pixel format. A non-zero exit is fatal for the job.
#[derive(Debug, Clone)]
pub struct VideoEncoder {
    preset: String,
    crf: u8,
    pixel_format: String,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Default for VideoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoEncoder {
    pub fn new() -> Self {
        Self {
            preset: "fast".to_string(),
            crf: 23,
            pixel_format: "yuv420p".to_string(),
            cancel_rx: None,
        }
    }

    /// Set a cancellation signal; when it flips to true the encoder kills
    /// the FFmpeg process and returns [`RenderError::Cancelled`].
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Check that FFmpeg is reachable.
    pub fn check() -> RenderResult<PathBuf> {
        which::which("ffmpeg").map_err(|_| RenderError::FfmpegNotFound)
    }

    /// Build the FFmpeg argument list for a manifest/output pair.
    pub fn build_args(&self, manifest: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-progress".to_string(),
            "pipe:2".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            manifest.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!("format={}", self.pixel_format),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Run the encode, reporting completion fraction in [0, 1].
    ///
    /// `planned_runtime` is the manifest's duration sum; FFmpeg's progress
    /// stream is mapped against it. The worker is occupied for the full
    /// runtime of this call.
    pub async fn encode<F>(
        &self,
        manifest: &Path,
        output: &Path,
        planned_runtime: f64,
        progress_callback: F,
    ) -> RenderResult<()>
    where
        F: Fn(f64) + Send + 'static,
    {
        Self::check()?;

        let args = self.build_args(manifest, output);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr).lines();

        // Both -progress output and error diagnostics arrive on stderr;
        // keep the non-progress tail for failure messages.
        let stderr_task = tokio::spawn(async move {
            let mut diagnostics: Vec<String> = Vec::new();
            while let Ok(Some(line)) = reader.next_line().await {
                match parse_progress_line(&line) {
                    Some(out_time_ms) => {
                        if planned_runtime > 0.0 {
                            let fraction =
                                (out_time_ms as f64 / 1000.0 / planned_runtime).clamp(0.0, 1.0);
                            progress_callback(fraction);
                        }
                    }
                    None if is_progress_key(&line) => {}
                    None => {
                        diagnostics.push(line);
                        if diagnostics.len() > DIAGNOSTIC_TAIL_LINES {
                            diagnostics.remove(0);
                        }
                    }
                }
            }
            diagnostics
        });

        // Wait for completion, polling the cancellation flag.
        let status = loop {
            match tokio::time::timeout(CANCEL_POLL_INTERVAL, child.wait()).await {
                Ok(status) => break status?,
                Err(_) => {
                    if let Some(rx) = &self.cancel_rx {
                        if *rx.borrow() {
                            info!("Encode cancelled, killing FFmpeg");
                            let _ = child.kill().await;
                            let _ = stderr_task.await;
                            return Err(RenderError::Cancelled);
                        }
                    }
                }
            }
        };

        let diagnostics = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            warn!("FFmpeg exited with {:?}", status.code());
            let message = if diagnostics.is_empty() {
                "FFmpeg exited with non-zero status".to_string()
            } else {
                diagnostics.join("\n")
            };
            Err(RenderError::encode_failed(message, status.code()))
        }
    }
}

/// Extract `out_time_ms`/`out_time_us` values from FFmpeg's `-progress`
/// stream. Returns the position in milliseconds.
fn parse_progress_line(line: &str) -> Option<i64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_ms" | "out_time_us" => {
            // Despite the name, out_time_ms has been microseconds in every
            // FFmpeg release that also emits out_time_us.
            let us: i64 = value.parse().ok()?;
            Some(us / 1000)
        }
        _ => None,
    }
}

/// Whether a stderr line belongs to the `-progress` key/value stream.
fn is_progress_key(line: &str) -> bool {
    const KEYS: [&str; 11] = [
        "frame", "fps", "stream_0_0_q", "bitrate", "total_size", "out_time",
        "dup_frames", "drop_frames", "speed", "progress", "out_time_us",
    ];
    match line.trim().split_once('=') {
        Some((key, _)) => KEYS.contains(&key) || key.starts_with("stream_"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_sequencing_contract() {
        let encoder = VideoEncoder::new();
        let args = encoder.build_args(Path::new("/tmp/j/concat.txt"), Path::new("/tmp/j/output.mp4"));

        let concat_pos = args.iter().position(|a| a == "concat").unwrap();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(concat_pos < input_pos, "-f concat must precede -i");

        assert!(args.contains(&"-safe".to_string()));
        assert!(args.contains(&"format=yuv420p".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/j/output.mp4");
    }

    #[test]
    fn test_progress_line_parsing() {
        assert_eq!(parse_progress_line("out_time_ms=5000000"), Some(5000));
        assert_eq!(parse_progress_line("out_time_us=250000"), Some(250));
        assert_eq!(parse_progress_line("frame=12"), None);
        assert_eq!(parse_progress_line("not a progress line"), None);
    }

    #[test]
    fn test_progress_keys_are_not_diagnostics() {
        assert!(is_progress_key("speed=1.5x"));
        assert!(is_progress_key("progress=end"));
        assert!(is_progress_key("stream_0_0_q=28.0"));
        assert!(!is_progress_key("[concat @ 0x55] impossible to open file"));
    }
}
