use std::path::Path;

use snapcode_core::MediaType;
use snapcode_logging::{snap_debug, snap_warn};

use crate::imaging::downscale_to_jpeg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeSettings {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            jpeg_quality: 85,
        }
    }
}

/// Image bytes ready to be sent to the understanding service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    /// False when optimization failed and the raw upload is used.
    pub optimized: bool,
}

/// Server-side optimization, independent of whatever the client did.
/// Falls back to the raw bytes rather than failing the request.
pub fn optimize_image(raw: Vec<u8>, media_type: MediaType, settings: &OptimizeSettings) -> OptimizedImage {
    match downscale_to_jpeg(
        &raw,
        settings.max_width,
        settings.max_height,
        settings.jpeg_quality,
    ) {
        Ok(encoded) => {
            snap_debug!(
                "Optimized upload {} -> {} bytes ({}x{})",
                raw.len(),
                encoded.bytes.len(),
                encoded.width,
                encoded.height
            );
            OptimizedImage {
                bytes: encoded.bytes,
                media_type: MediaType::Jpeg,
                optimized: true,
            }
        }
        Err(err) => {
            snap_warn!("Optimization failed, using raw upload: {}", err);
            OptimizedImage {
                bytes: raw,
                media_type,
                optimized: false,
            }
        }
    }
}

/// Reads a spooled upload and optimizes it.
pub fn optimize_file(
    path: &Path,
    media_type: MediaType,
    settings: &OptimizeSettings,
) -> std::io::Result<OptimizedImage> {
    let raw = std::fs::read(path)?;
    Ok(optimize_image(raw, media_type, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([30, 90, 200])));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn large_png_is_bounded_and_becomes_jpeg() {
        let raw = encoded(1600, 1200, ImageFormat::Png);
        let result = optimize_image(raw, MediaType::Png, &OptimizeSettings::default());
        assert!(result.optimized);
        assert_eq!(result.media_type, MediaType::Jpeg);
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 768));
    }

    #[test]
    fn small_jpeg_keeps_dimensions() {
        let raw = encoded(640, 480, ImageFormat::Jpeg);
        let result = optimize_image(raw, MediaType::Jpeg, &OptimizeSettings::default());
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (640, 480));
    }

    #[test]
    fn failure_falls_back_to_raw_bytes() {
        let raw = b"\x89PNG but truncated".to_vec();
        let result = optimize_image(raw.clone(), MediaType::Png, &OptimizeSettings::default());
        assert!(!result.optimized);
        assert_eq!(result.bytes, raw);
        assert_eq!(result.media_type, MediaType::Png);
    }
}
