//! Ordered-provider OCR engine.

use std::sync::Arc;
use std::time::Duration;

use crate::{OcrError, OcrProvider, OcrResult};

/// OCR engine: tries providers in order, stopping at the first success.
///
/// A provider failure (or timeout) is logged and the next provider is
/// tried; the last error is returned when every provider fails. The
/// `enabled` flag is administrative: when off, `run` fails fast with
/// [`OcrError::Disabled`] and no provider is called.
pub struct OcrEngine {
    providers: Vec<Arc<dyn OcrProvider>>,
    enabled: bool,
    timeout: Duration,
}

impl OcrEngine {
    pub fn new(providers: Vec<Arc<dyn OcrProvider>>, enabled: bool, timeout: Duration) -> Self {
        Self {
            providers,
            enabled,
            timeout,
        }
    }

    /// Engine that rejects every call. Used when OCR is administratively off.
    pub fn disabled() -> Self {
        Self::new(Vec::new(), false, Duration::from_secs(0))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.providers.is_empty()
    }

    /// Run text recognition over one image, trying providers in order.
    /// Returns the first successful result, trimmed.
    pub async fn run(&self, image: &[u8], prompt: &str) -> OcrResult<String> {
        if !self.enabled {
            return Err(OcrError::Disabled);
        }
        if self.providers.is_empty() {
            return Err(OcrError::NoProviders);
        }

        let mut last_error = OcrError::NoProviders;

        for provider in &self.providers {
            let start = std::time::Instant::now();
            let attempt = tokio::time::timeout(self.timeout, provider.recognize(image, prompt));

            match attempt.await {
                Ok(Ok(text)) => {
                    tracing::info!(
                        provider = provider.name(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        text_len = text.len(),
                        "OCR provider succeeded"
                    );
                    return Ok(text.trim().to_string());
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "OCR provider failed, trying next"
                    );
                    last_error = e;
                }
                Err(_) => {
                    let timeout_secs = self.timeout.as_secs();
                    tracing::warn!(
                        provider = provider.name(),
                        timeout_secs,
                        "OCR provider timed out, trying next"
                    );
                    last_error = OcrError::Timeout(timeout_secs);
                }
            }
        }

        Err(last_error)
    }
}
