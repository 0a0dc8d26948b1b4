//! Image normalization
//!
//! Images whose pixel area exceeds the configured budget are shrunk to fit
//! and re-encoded as JPEG. Images within budget pass through byte-for-byte.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageError};

/// Result of normalizing one downloaded image
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Final bytes to fingerprint and store
    pub bytes: Vec<u8>,

    /// Final width in pixels
    pub width: u32,

    /// Final height in pixels
    pub height: u32,

    /// Whether the bytes were re-encoded
    pub recompressed: bool,
}

/// Normalizes image bytes against a pixel-area budget
///
/// # Arguments
///
/// * `bytes` - The downloaded payload
/// * `max_pixels` - Largest allowed `width * height`
/// * `quality` - JPEG quality for re-encoding
///
/// # Returns
///
/// * `Ok(NormalizedImage)` - The original bytes when `width * height <= max_pixels`,
///   otherwise a shrunk JPEG re-encoding
/// * `Err(ImageError)` - The payload is not a decodable image
pub fn normalize(
    bytes: Vec<u8>,
    max_pixels: u64,
    quality: u8,
) -> Result<NormalizedImage, ImageError> {
    let img = image::load_from_memory(&bytes)?;
    let (width, height) = img.dimensions();

    if u64::from(width) * u64::from(height) <= max_pixels {
        return Ok(NormalizedImage {
            bytes,
            width,
            height,
            recompressed: false,
        });
    }

    let (target_w, target_h) = fit_within_area(width, height, max_pixels);
    let resized = img.resize(target_w, target_h, FilterType::Triangle);
    let encoded = encode_jpeg(&resized, quality)?;

    tracing::trace!(
        "Recompressed {}x{} image to {}x{} ({} -> {} bytes)",
        width,
        height,
        resized.width(),
        resized.height(),
        bytes.len(),
        encoded.len()
    );

    Ok(NormalizedImage {
        bytes: encoded,
        width: resized.width(),
        height: resized.height(),
        recompressed: true,
    })
}

/// Computes bounding dimensions whose area does not exceed `max_pixels`
fn fit_within_area(width: u32, height: u32, max_pixels: u64) -> (u32, u32) {
    let area = u64::from(width) * u64::from(height);
    let scale = (max_pixels as f64 / area as f64).sqrt();

    let new_h = ((f64::from(height) * scale).floor() as u32).max(1);
    let new_w = ((f64::from(width) * scale).floor() as u32).max(1);

    // Clamping to 1 on a very thin image can overshoot the budget
    let max_w = (max_pixels / u64::from(new_h)).clamp(1, u64::from(u32::MAX)) as u32;

    (new_w.min(max_w), new_h)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)?;
    Ok(out)
}
