//! Content validation errors.
//!
//! These errors are surfaced to the caller at submission time; a job that
//! trips one is never created. The worker re-checks the word ceiling as a
//! defense against payloads enqueued without going through the API.

use thiserror::Error;

/// Hard ceiling on the word count of a single job.
///
/// Bounds pipeline latency and frame-storage usage.
pub const MAX_WORD_COUNT: usize = 100_000;

pub type ContentResult<T> = Result<T, ContentError>;

/// Errors rejecting input content before a job is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("No text or file provided")]
    NoInput,

    #[error("No text content found")]
    EmptyText,

    #[error("Text exceeds {limit} word limit (found {found} words)")]
    WordLimit { found: usize, limit: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File too large (max {0} bytes)")]
    UploadTooLarge(usize),

    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    #[error("Failed to parse file: {0}")]
    ExtractionFailed(String),
}

impl ContentError {
    /// Word-limit error against [`MAX_WORD_COUNT`].
    pub fn word_limit(found: usize) -> Self {
        Self::WordLimit {
            found,
            limit: MAX_WORD_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_limit_message() {
        let err = ContentError::word_limit(123_456);
        assert_eq!(
            err.to_string(),
            "Text exceeds 100000 word limit (found 123456 words)"
        );
    }
}
