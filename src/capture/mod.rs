//! Cover image capture.
//!
//! A "capture" here is an image file on disk. Without a crop the file's
//! bytes go to OCR untouched; with one, the image is decoded, cropped from
//! the origin and re-encoded as JPEG.

mod region;

pub use region::{crop_to_jpeg_bytes, CropRegion};

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode or encode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Load a cover image, optionally cropped, as bytes ready for upload.
pub async fn load_cover(path: &Path, crop: Option<CropRegion>) -> Result<Vec<u8>, CaptureError> {
    let start = std::time::Instant::now();
    let bytes = tokio::fs::read(path).await.map_err(|source| CaptureError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let Some(region) = crop else {
        log::info!(
            "[CAPTURE] Loaded {} ({} bytes) in {}ms",
            path.display(),
            bytes.len(),
            start.elapsed().as_millis()
        );
        return Ok(bytes);
    };

    let image_err = |source| CaptureError::Image {
        path: path.display().to_string(),
        source,
    };
    let decoded = image::load_from_memory(&bytes).map_err(image_err)?;
    let jpeg = crop_to_jpeg_bytes(&decoded, region).map_err(image_err)?;
    log::info!(
        "[CAPTURE] Cropped {} ({}x{}) to {}, {} bytes in {}ms",
        path.display(),
        decoded.width(),
        decoded.height(),
        region,
        jpeg.len(),
        start.elapsed().as_millis()
    );
    Ok(jpeg)
}
