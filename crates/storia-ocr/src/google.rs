//! OCR provider backed by the Google Cloud Vision API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{OcrError, OcrProvider, OcrResult};

const HTTP_TIMEOUT_SECS: u64 = 60;

/// OCR provider using Google Cloud Vision `TEXT_DETECTION`.
///
/// The transcription prompt is ignored; Vision returns the raw detected
/// text, which is all the fan-out pipeline needs from a fallback provider.
pub struct GoogleVisionOcrProvider {
    http_client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    responses: Vec<AnnotateResponse>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(rename = "fullTextAnnotation")]
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<VisionError>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct VisionError {
    message: String,
}

impl GoogleVisionOcrProvider {
    pub fn new(api_key: String) -> OcrResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| OcrError::Provider {
                provider: "google_vision",
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_key,
        })
    }

    fn provider_error(message: String) -> OcrError {
        OcrError::Provider {
            provider: "google_vision",
            message,
        }
    }
}

#[async_trait]
impl OcrProvider for GoogleVisionOcrProvider {
    fn name(&self) -> &'static str {
        "google_vision"
    }

    async fn recognize(&self, image: &[u8], _prompt: &str) -> OcrResult<String> {
        use base64::Engine;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image);

        let url = format!(
            "https://vision.googleapis.com/v1/images:annotate?key={}",
            self.api_key
        );

        let request_body = json!({
            "requests": [{
                "image": { "content": image_base64 },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Self::provider_error(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::provider_error(format!(
                "API request failed: {} - {}",
                status, error_text
            )));
        }

        let parsed: VisionResponse = response
            .json()
            .await
            .map_err(|e| Self::provider_error(format!("Failed to parse response: {}", e)))?;

        let annotate = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| Self::provider_error("Empty annotate response".to_string()))?;

        if let Some(error) = annotate.error {
            return Err(Self::provider_error(error.message));
        }

        // No annotation at all means the page had no detectable text
        Ok(annotate
            .full_text_annotation
            .map(|a| a.text)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parsing_extracts_full_text() {
        let raw = r#"{"responses":[{"fullTextAnnotation":{"text":"detected text"}}]}"#;
        let parsed: VisionResponse = serde_json::from_str(raw).unwrap();
        let annotate = parsed.responses.into_iter().next().unwrap();
        assert_eq!(annotate.full_text_annotation.unwrap().text, "detected text");
    }

    #[test]
    fn response_parsing_handles_missing_annotation() {
        let raw = r#"{"responses":[{}]}"#;
        let parsed: VisionResponse = serde_json::from_str(raw).unwrap();
        let annotate = parsed.responses.into_iter().next().unwrap();
        assert!(annotate.full_text_annotation.is_none());
        assert!(annotate.error.is_none());
    }

    #[test]
    fn response_parsing_surfaces_api_error() {
        let raw = r#"{"responses":[{"error":{"message":"quota exceeded"}}]}"#;
        let parsed: VisionResponse = serde_json::from_str(raw).unwrap();
        let annotate = parsed.responses.into_iter().next().unwrap();
        assert_eq!(annotate.error.unwrap().message, "quota exceeded");
    }
}
