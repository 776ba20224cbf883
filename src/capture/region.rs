//! Crop a decoded cover to a fixed region and re-encode it as JPEG.

use image::DynamicImage;
use std::fmt;
use std::str::FromStr;

/// Region size anchored at the image origin, e.g. `900x900`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// The scan frame used for phone captures.
    pub const COVER_FRAME: CropRegion = CropRegion {
        width: 900,
        height: 900,
    };

    /// Clamp to the image bounds so the crop never reads past the edge.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> CropRegion {
        CropRegion {
            width: self.width.min(image_width),
            height: self.height.min(image_height),
        }
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for CropRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .to_lowercase()
            .split_once('x')
            .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
            .ok_or_else(|| format!("Invalid crop '{}'. Use WIDTHxHEIGHT, e.g. 900x900.", s))?;
        let width: u32 = w
            .parse()
            .map_err(|_| format!("Invalid crop width '{}'", w))?;
        let height: u32 = h
            .parse()
            .map_err(|_| format!("Invalid crop height '{}'", h))?;
        if width == 0 || height == 0 {
            return Err("Crop dimensions must be non-zero".to_string());
        }
        Ok(CropRegion { width, height })
    }
}

/// Crop `image` to `region` (clamped) and encode the result as JPEG bytes.
pub fn crop_to_jpeg_bytes(
    image: &DynamicImage,
    region: CropRegion,
) -> Result<Vec<u8>, image::ImageError> {
    let region = region.clamp_to(image.width(), image.height());
    // JPEG has no alpha channel.
    let cropped = image.crop_imm(0, 0, region.width, region.height).to_rgb8();

    let mut jpeg_bytes = Vec::new();
    cropped.write_to(
        &mut std::io::Cursor::new(&mut jpeg_bytes),
        image::ImageFormat::Jpeg,
    )?;
    Ok(jpeg_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbaImage};

    #[test]
    fn parses_width_by_height() {
        assert_eq!(
            "900x900".parse::<CropRegion>().unwrap(),
            CropRegion::COVER_FRAME
        );
        assert_eq!(
            "640X480".parse::<CropRegion>().unwrap(),
            CropRegion { width: 640, height: 480 }
        );
        assert!("900".parse::<CropRegion>().is_err());
        assert!("0x10".parse::<CropRegion>().is_err());
        assert!("axb".parse::<CropRegion>().is_err());
    }

    #[test]
    fn crop_is_clamped_to_small_images() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(120, 80));
        let bytes = crop_to_jpeg_bytes(&image, CropRegion::COVER_FRAME).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (120, 80));
    }

    #[test]
    fn crop_takes_region_from_origin() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(300, 200));
        let bytes = crop_to_jpeg_bytes(&image, CropRegion { width: 100, height: 50 }).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }
}
