//! Error types for rendering and encoding.

use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering frames or encoding video.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg error: {message}")]
    EncodeFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Frame image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Create an encode failure carrying the encoder's diagnostic output.
    pub fn encode_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::EncodeFailed {
            message: message.into(),
            exit_code,
        }
    }
}
