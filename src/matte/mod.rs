pub mod encode;
pub mod engine;
pub mod mask;
pub mod smooth;
pub mod source;

pub use encode::{encode_png, encode_png_data_uri};
pub use engine::{matte, MatteEngine};
pub use mask::{apply_mask, classify, Coverage};
pub use smooth::{smooth_edges, smooth_pass};
pub use source::ImageSource;

/// Tuning for background removal.
///
/// # Fields
/// - `threshold`: every channel must exceed this for a pixel to count as bright
/// - `tolerance`: every pairwise channel difference must stay below this for a
///   pixel to count as neutral (grey/white rather than coloured)
/// - `passes`: number of edge-smoothing passes run after the mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatteParams {
    pub threshold: u8,
    pub tolerance: u32,
    pub passes: usize,
}

impl Default for MatteParams {
    fn default() -> Self {
        MatteParams { threshold: 240, tolerance: 30, passes: 2 }
    }
}

impl MatteParams {
    /// Builds params from loosely-typed request values, clamping the threshold
    /// into `0..=255` and the tolerance to `>= 0`.
    ///
    /// A negative threshold becomes 0, so pure black (channel value 0) still
    /// counts as not bright.
    pub fn from_request(threshold: i64, tolerance: i64) -> Self {
        MatteParams {
            threshold: threshold.clamp(0, 255) as u8,
            tolerance: tolerance.clamp(0, u32::MAX as i64) as u32,
            ..Default::default()
        }
    }
}
