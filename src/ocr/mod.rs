//! OCR domain: cover text recognition via remote vision APIs.
//!
//! Two independent providers implement `TextRecognizer`:
//!   - vision.rs:    Google Cloud Vision TEXT_DETECTION (primary)
//!   - ocr_space.rs: OCR.space multipart upload (fallback)
//!
//! The fallback is never chained automatically; callers pick a provider.
//! External code should only use the items exported here.

pub mod heuristics;
mod ocr_space;
mod vision;

pub use ocr_space::{OcrSpaceRecognizer, DEFAULT_OCR_SPACE_API_URL};
pub use vision::{VisionRecognizer, DEFAULT_VISION_API_URL};

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum RecognizeError {
    /// The image could not be read; no request was sent.
    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to perform text recognition ({provider})")]
    RecognitionFailed { provider: OcrProvider },
}

/// Which remote OCR service to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrProvider {
    #[default]
    Vision,
    OcrSpace,
}

impl OcrProvider {
    pub fn id(&self) -> &'static str {
        match self {
            OcrProvider::Vision => "vision",
            OcrProvider::OcrSpace => "ocr-space",
        }
    }
}

impl fmt::Display for OcrProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for OcrProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vision" | "google" => Ok(OcrProvider::Vision),
            "ocr-space" | "ocrspace" | "ocr_space" => Ok(OcrProvider::OcrSpace),
            other => Err(format!(
                "Unknown OCR provider: {}. Use 'vision' or 'ocr-space'.",
                other
            )),
        }
    }
}

/// A remote service that turns image bytes into text.
///
/// `Ok(None)` means the service answered but found no text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn provider(&self) -> OcrProvider;

    async fn recognize(&self, image: &[u8]) -> Result<Option<String>, RecognizeError>;

    /// Read an image from disk and recognize it. Read failures surface as
    /// `ImageRead` before any network call is made.
    async fn recognize_file(&self, path: &Path) -> Result<Option<String>, RecognizeError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| RecognizeError::ImageRead {
                path: path.display().to_string(),
                source,
            })?;
        self.recognize(&bytes).await
    }
}
