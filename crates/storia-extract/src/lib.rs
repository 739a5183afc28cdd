//! Storia Extract Library
//!
//! Synchronous document text extraction, dispatched by file extension:
//! PDF via `pdf-extract`, DOCX by reading `word/document.xml` out of the
//! OOXML archive, and plain text with a lossy UTF-8 fallback.
//!
//! `extract_text` returns `Ok(None)` for unsupported formats and an error
//! only when a supported format fails to parse. Callers decide what an
//! empty or missing result means for the request.

mod docx;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Failed to extract text from DOCX: {0}")]
    Docx(String),
}

/// Extract text from a document based on its filename extension.
///
/// Returns `Ok(None)` when the extension is missing or not a supported
/// document format.
pub fn extract_text(data: &[u8], filename: &str) -> Result<Option<String>, ExtractError> {
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return Ok(None),
    };

    match extension.as_str() {
        "pdf" => extract_from_pdf(data).map(Some),
        "docx" | "doc" => docx::extract_from_docx(data).map(Some),
        "txt" | "text" => Ok(Some(extract_from_txt(data))),
        _ => Ok(None),
    }
}

/// Extract text from a PDF document.
fn extract_from_pdf(data: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Decode a plain text file. Tries strict UTF-8 first and falls back to a
/// lossy decode so a stray byte never rejects an otherwise readable file.
fn extract_from_txt(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!("Text file is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(data).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_decodes_utf8() {
        let text = extract_text("Hello world".as_bytes(), "story.txt")
            .unwrap()
            .unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn txt_accepts_text_extension() {
        let text = extract_text(b"via .text", "notes.text").unwrap().unwrap();
        assert_eq!(text, "via .text");
    }

    #[test]
    fn txt_falls_back_to_lossy_decode() {
        let mut data = b"Hello ".to_vec();
        data.push(0xFF);
        data.extend_from_slice(b"world");

        let text = extract_text(&data, "story.txt").unwrap().unwrap();
        assert!(text.starts_with("Hello "));
        assert!(text.ends_with("world"));
    }

    #[test]
    fn unsupported_extension_returns_none() {
        assert!(extract_text(b"bytes", "image.png").unwrap().is_none());
        assert!(extract_text(b"bytes", "archive.zip").unwrap().is_none());
    }

    #[test]
    fn missing_extension_returns_none() {
        assert!(extract_text(b"bytes", "README").unwrap().is_none());
    }

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        let text = extract_text(b"CAPS", "STORY.TXT").unwrap().unwrap();
        assert_eq!(text, "CAPS");
    }

    #[test]
    fn invalid_pdf_is_an_error() {
        assert!(extract_text(b"not a pdf", "broken.pdf").is_err());
    }
}
