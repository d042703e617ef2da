use image::{Rgba, RgbaImage};

use crate::matte::MatteParams;

/// Two-level alpha decision for a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Bright and neutral: part of the white-ish background.
    Background,
    Foreground,
}

impl Coverage {
    pub fn alpha(self) -> u8 {
        match self {
            Coverage::Background => 0,
            Coverage::Foreground => 255,
        }
    }
}

/// Classifies a pixel from its colour channels only; the incoming alpha is
/// ignored.
pub fn classify(px: &Rgba<u8>, params: &MatteParams) -> Coverage {
    let [r, g, b, _] = px.0;
    let t = params.threshold;
    let is_bright = r > t && g > t && b > t;

    let close = |x: u8, y: u8| u32::from(x.abs_diff(y)) < params.tolerance;
    let is_neutral = close(r, g) && close(g, b) && close(r, b);

    if is_bright && is_neutral {
        Coverage::Background
    } else {
        Coverage::Foreground
    }
}

/// Replaces every pixel's alpha with 0 (background) or 255 (foreground).
/// Colour channels pass through untouched.
pub fn apply_mask(src: &RgbaImage, params: &MatteParams) -> RgbaImage {
    let mut out = src.clone();
    for px in out.pixels_mut() {
        px.0[3] = classify(px, params).alpha();
    }
    out
}
