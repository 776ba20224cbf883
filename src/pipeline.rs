//! Cover-to-book scan pipeline.
//!
//! load → OCR → query heuristic → Google Books lookup → outcome.
//! "No text" and "not found" are outcomes, not errors; only transport and
//! I/O failures come back as `PipelineError`.

use crate::books::{BookRecord, BooksClient, ResolveError};
use crate::capture::{self, CaptureError, CropRegion};
use crate::ocr::heuristics::build_search_query;
use crate::ocr::{RecognizeError, TextRecognizer};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Recognize(#[from] RecognizeError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// OCR found nothing usable on the cover.
    NoText,
    /// Text was read but no volume matched the derived query.
    NotFound { text: String, query: String },
    Found {
        text: String,
        query: String,
        book: BookRecord,
    },
}

impl ScanOutcome {
    pub fn book(&self) -> Option<&BookRecord> {
        match self {
            ScanOutcome::Found { book, .. } => Some(book),
            _ => None,
        }
    }
}

/// Scan a cover image file, optionally cropping it first.
pub async fn scan_file(
    recognizer: &dyn TextRecognizer,
    books: &BooksClient,
    path: &Path,
    crop: Option<CropRegion>,
) -> Result<ScanOutcome, PipelineError> {
    let image = capture::load_cover(path, crop).await?;
    scan_image(recognizer, books, &image).await
}

/// Scan in-memory image bytes.
pub async fn scan_image(
    recognizer: &dyn TextRecognizer,
    books: &BooksClient,
    image: &[u8],
) -> Result<ScanOutcome, PipelineError> {
    let pipeline_start = std::time::Instant::now();

    // Stage 1: OCR
    let ocr_start = std::time::Instant::now();
    let text = recognizer.recognize(image).await?;
    let ocr_ms = ocr_start.elapsed().as_millis();
    log::info!("[PIPELINE] OCR ({}): {}ms", recognizer.provider(), ocr_ms);

    let text = match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            log::info!("[PIPELINE] No text detected");
            return Ok(ScanOutcome::NoText);
        }
    };

    // Stage 2: query heuristic
    let query = build_search_query(Some(&text));
    log::info!("[PIPELINE] Query: {:?}", query);

    // Stage 3: metadata lookup
    let lookup_start = std::time::Instant::now();
    let found = books.search(&query).await?;
    let lookup_ms = lookup_start.elapsed().as_millis();

    log::info!(
        "[PIPELINE] Total: {}ms (ocr={} + lookup={})",
        pipeline_start.elapsed().as_millis(),
        ocr_ms,
        lookup_ms
    );

    Ok(match found {
        Some(book) => {
            log::info!("[PIPELINE] Found '{}' ({})", book.title, book.id);
            ScanOutcome::Found { text, query, book }
        }
        None => {
            log::info!("[PIPELINE] No book matched");
            ScanOutcome::NotFound { text, query }
        }
    })
}
