use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, RgbaImage};

use crate::error::WorkshopResult;
use crate::matte::source::data_uri;

/// Encodes an RGBA image as a best-compression PNG.
pub fn encode_png(img: &RgbaImage) -> WorkshopResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)?;
    Ok(buf)
}

/// Encodes an RGBA image as `data:image/png;base64,...`.
pub fn encode_png_data_uri(img: &RgbaImage) -> WorkshopResult<String> {
    Ok(data_uri("image/png", &encode_png(img)?))
}
