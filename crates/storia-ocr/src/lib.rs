//! Storia OCR Library
//!
//! This crate provides the OCR engine used for comic/manga page
//! transcription. The engine owns an ordered list of providers (Anthropic
//! messages API, Google Cloud Vision) tried in sequence with a bounded
//! per-call timeout, plus an administrative enable flag. The engine is an
//! explicitly constructed, dependency-injected object; there is no global
//! model state.

mod anthropic;
mod engine;
mod google;

use async_trait::async_trait;
use thiserror::Error;

pub use anthropic::AnthropicOcrProvider;
pub use engine::OcrEngine;
pub use google::GoogleVisionOcrProvider;

/// Transcription prompt for comic/manga pages.
pub const DEFAULT_OCR_PROMPT: &str = "\
Extract only the exact text visible in this comic/manga page.
No descriptions, no summaries, no JSON, no quotes, no translation.
Preserve original casing, punctuation, and line breaks.
Reading direction = RTL (panel order as specified).
Order: speech balloons, then narration, then SFX. Illegible -> [illegible].
If no text -> EMPTY.";

/// OCR operation errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR service is disabled")]
    Disabled,

    #[error("OCR call timed out after {0}s")]
    Timeout(u64),

    #[error("No OCR providers configured")]
    NoProviders,

    #[error("Provider {provider} failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },
}

pub type OcrResult<T> = Result<T, OcrError>;

/// One OCR capability provider.
///
/// Providers must be callable concurrently for independent images.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Stable provider name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Run text recognition over one image.
    async fn recognize(&self, image: &[u8], prompt: &str) -> OcrResult<String>;
}

/// Detect image media type from magic numbers.
pub(crate) fn detect_media_type(data: &[u8]) -> &'static str {
    if data.len() < 4 {
        return "image/jpeg"; // Default
    }

    // JPEG: FF D8 FF
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return "image/jpeg";
    }

    // PNG: 89 50 4E 47
    if data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47 {
        return "image/png";
    }

    // GIF: 47 49 46
    if data[0] == 0x47 && data[1] == 0x49 && data[2] == 0x46 {
        return "image/gif";
    }

    // WebP: RIFF ... WEBP
    if data.len() >= 12
        && data[0] == 0x52
        && data[1] == 0x49
        && data[2] == 0x46
        && data[3] == 0x46
        && data[8] == 0x57
        && data[9] == 0x45
        && data[10] == 0x42
        && data[11] == 0x50
    {
        return "image/webp";
    }

    "image/jpeg" // Default
}
