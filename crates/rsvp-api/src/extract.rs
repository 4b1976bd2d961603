//! Text extraction from uploaded files.
//!
//! Plain text is read directly; markdown is parsed and flattened to its
//! text content. Anything else is rejected: the job pipeline only ever
//! sees UTF-8 text.

use pulldown_cmark::{Event, Parser};
use rsvp_models::{ContentError, ContentResult};

/// Maximum accepted upload size in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// An uploaded file as received from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    fn extension(&self) -> Option<&str> {
        self.filename.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// Extract UTF-8 text from an uploaded file.
pub fn extract_text(file: &UploadedFile) -> ContentResult<String> {
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ContentError::UploadTooLarge(MAX_UPLOAD_BYTES));
    }

    let ext = file.extension().unwrap_or_default().to_ascii_lowercase();

    if file.content_type == "text/plain" || ext == "txt" {
        return Ok(String::from_utf8_lossy(&file.bytes).into_owned());
    }

    if file.content_type == "text/markdown" || ext == "md" {
        let source = String::from_utf8_lossy(&file.bytes);
        return Ok(markdown_to_text(&source));
    }

    Err(ContentError::UnsupportedFileType(
        if file.content_type.is_empty() {
            file.filename.clone()
        } else {
            file.content_type.clone()
        },
    ))
}

/// Flatten markdown to its visible text content.
fn markdown_to_text(source: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(source) {
        match event {
            Event::Text(text) | Event::Code(text) => {
                out.push_str(&text);
                out.push(' ');
            }
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: &str, content_type: &str, body: &str) -> UploadedFile {
        UploadedFile {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_plain_text_passthrough() {
        let file = upload("notes.txt", "text/plain", "speed reading is great");
        assert_eq!(extract_text(&file).unwrap(), "speed reading is great");
    }

    #[test]
    fn test_extension_fallback_when_content_type_missing() {
        let file = upload("notes.txt", "", "hello");
        assert_eq!(extract_text(&file).unwrap(), "hello");
    }

    #[test]
    fn test_markdown_flattened_to_text() {
        let file = upload(
            "doc.md",
            "text/markdown",
            "# Title\n\nSome *emphasis* and `code`.\n",
        );
        let text = extract_text(&file).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("emphasis"));
        assert!(text.contains("code"));
        assert!(!text.contains('#'));
        assert!(!text.contains('*'));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let file = upload("report.pdf", "application/pdf", "%PDF-1.4");
        assert_eq!(
            extract_text(&file),
            Err(ContentError::UnsupportedFileType("application/pdf".into()))
        );
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let file = UploadedFile {
            filename: "big.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: vec![b'a'; MAX_UPLOAD_BYTES + 1],
        };
        assert_eq!(
            extract_text(&file),
            Err(ContentError::UploadTooLarge(MAX_UPLOAD_BYTES))
        );
    }
}
