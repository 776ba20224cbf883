//! OCR.space fallback provider.
//!
//! Multipart upload with `file`, `apikey`, `language=eng` and
//! `isOverlayRequired=false`. Parsed text is in
//! `ParsedResults[0].ParsedText`; `IsErroredOnProcessing` flags a failed job
//! even on HTTP 200.

use super::{OcrProvider, RecognizeError, TextRecognizer};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

pub const DEFAULT_OCR_SPACE_API_URL: &str = "https://api.ocr.space/parse/image";
const LANGUAGE: &str = "eng";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParseResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    is_errored_on_processing: Option<bool>,
    /// String or array of strings depending on the failure.
    #[serde(default)]
    error_message: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

pub struct OcrSpaceRecognizer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OcrSpaceRecognizer {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    fn failed(&self) -> RecognizeError {
        RecognizeError::RecognitionFailed {
            provider: OcrProvider::OcrSpace,
        }
    }
}

#[async_trait]
impl TextRecognizer for OcrSpaceRecognizer {
    fn provider(&self) -> OcrProvider {
        OcrProvider::OcrSpace
    }

    async fn recognize(&self, image: &[u8]) -> Result<Option<String>, RecognizeError> {
        log::info!("[OCR] Provider: ocr-space ({} image bytes)", image.len());

        let file = Part::bytes(image.to_vec())
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| {
                log::error!("[OCR] Invalid multipart mime: {}", e);
                self.failed()
            })?;
        let form = Form::new()
            .part("file", file)
            .text("apikey", self.api_key.clone())
            .text("language", LANGUAGE)
            .text("isOverlayRequired", "false");

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(&self.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("[OCR] OCR.space request failed: {}", e);
                self.failed()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[OCR] OCR.space returned {}: {}", status, body);
            return Err(self.failed());
        }

        let parsed: ParseResponse = response.json().await.map_err(|e| {
            log::error!("[OCR] Failed to decode OCR.space response: {}", e);
            self.failed()
        })?;
        log::info!("[OCR] OCR.space responded in {}ms", start.elapsed().as_millis());

        if parsed.is_errored_on_processing.unwrap_or(false) {
            log::warn!("[OCR] OCR.space processing error: {}", parsed.error_message);
            return Ok(None);
        }

        let text = parsed
            .parsed_results
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.parsed_text);
        match &text {
            Some(t) => log::info!("[OCR] Extracted {} chars", t.chars().count()),
            None => log::info!("[OCR] No parsed results"),
        }
        Ok(text)
    }
}
