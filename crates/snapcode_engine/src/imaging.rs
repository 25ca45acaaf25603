use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageResult, RgbImage};

/// A re-encoded JPEG and its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Dimensions that fit inside `max_width` x `max_height` with the aspect
/// ratio preserved. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    (
        scaled(width).min(max_width),
        scaled(height).min(max_height),
    )
}

/// Decodes `bytes`, downsizes to fit the bounds and re-encodes as JPEG.
pub(crate) fn downscale_to_jpeg(
    bytes: &[u8],
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> ImageResult<EncodedImage> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = fit_within(decoded.width(), decoded.height(), max_width, max_height);
    let resized = if (width, height) == decoded.dimensions() {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    let rgb = flatten_onto_white(&resized);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;

    Ok(EncodedImage {
        bytes: out,
        width,
        height,
    })
}

/// JPEG has no alpha channel; transparent pixels are composited onto white.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8;
        image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    })
}
