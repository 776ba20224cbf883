//! Google Cloud Vision TEXT_DETECTION.
//!
//! Request body:
//!   {"requests": [{"image": {"content": <base64>},
//!                  "features": [{"type": "TEXT_DETECTION", "maxResults": 5}]}]}
//!
//! The API key goes in the URL query, not a header. The first text
//! annotation holds the full recognized block; later ones are per-word.

use super::{OcrProvider, RecognizeError, TextRecognizer};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

pub const DEFAULT_VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";
const MAX_RESULTS: u32 = 5;

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

pub struct VisionRecognizer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl VisionRecognizer {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    fn failed(&self) -> RecognizeError {
        RecognizeError::RecognitionFailed {
            provider: OcrProvider::Vision,
        }
    }
}

#[async_trait]
impl TextRecognizer for VisionRecognizer {
    fn provider(&self) -> OcrProvider {
        OcrProvider::Vision
    }

    async fn recognize(&self, image: &[u8]) -> Result<Option<String>, RecognizeError> {
        let content = base64::engine::general_purpose::STANDARD.encode(image);
        log::info!("[OCR] Provider: vision ({} image bytes)", image.len());

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "requests": [
                    {
                        "image": { "content": content },
                        "features": [
                            { "type": "TEXT_DETECTION", "maxResults": MAX_RESULTS }
                        ]
                    }
                ]
            }))
            .send()
            .await
            .map_err(|e| {
                log::error!("[OCR] Vision request failed: {}", e);
                self.failed()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[OCR] Vision API returned {}: {}", status, body);
            return Err(self.failed());
        }

        let parsed: AnnotateResponse = response.json().await.map_err(|e| {
            log::error!("[OCR] Failed to decode Vision response: {}", e);
            self.failed()
        })?;
        log::info!("[OCR] Vision responded in {}ms", start.elapsed().as_millis());

        let Some(first) = parsed.responses.into_iter().next() else {
            log::warn!("[OCR] Vision returned no responses");
            return Ok(None);
        };
        if let Some(err) = first.error {
            log::error!("[OCR] Vision error {}: {}", err.code, err.message);
            return Err(self.failed());
        }

        let text = first
            .text_annotations
            .into_iter()
            .next()
            .map(|a| a.description);
        match &text {
            Some(t) => log::info!("[OCR] Extracted {} chars", t.chars().count()),
            None => log::info!("[OCR] No text annotations"),
        }
        Ok(text)
    }
}
