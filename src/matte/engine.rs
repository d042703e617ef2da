use image::{DynamicImage, RgbaImage};

use crate::error::WorkshopResult;
use crate::http::ImageFetcher;
use crate::matte::{apply_mask, encode_png_data_uri, smooth_edges, ImageSource, MatteParams};
use crate::outcome::{FallbackReason, Outcome};

/// Runs the mask and the smoothing passes on a decoded image.
pub fn matte(img: &DynamicImage, params: &MatteParams) -> RgbaImage {
    let rgba = img.to_rgba8();
    let masked = apply_mask(&rgba, params);
    smooth_edges(&masked, params.passes)
}

/// Turns white-ish backgrounds transparent.
///
/// Owns only a fetcher; every call allocates and drops its own buffers.
pub struct MatteEngine<F> {
    fetcher: F,
}

impl<F: ImageFetcher> MatteEngine<F> {
    pub fn new(fetcher: F) -> Self {
        MatteEngine { fetcher }
    }

    /// Returns the matted image as a PNG data URI.
    ///
    /// Never fails: a download, decode or encode error yields
    /// `Outcome::Fallback` carrying the source's original reference.
    #[tracing::instrument(skip_all, fields(threshold = params.threshold, tolerance = params.tolerance))]
    pub fn remove_background(&self, source: &ImageSource, params: &MatteParams) -> Outcome<String> {
        match self.try_remove_background(source, params) {
            Ok(uri) => {
                tracing::info!(bytes = uri.len(), "background removed");
                Outcome::Primary(uri)
            }
            Err(err) => {
                tracing::warn!(error = %err, "background removal failed, returning original");
                Outcome::fallback(source.reference(), FallbackReason::Failed(err))
            }
        }
    }

    fn try_remove_background(&self, source: &ImageSource, params: &MatteParams) -> WorkshopResult<String> {
        let bytes = source.load(&self.fetcher)?;
        tracing::debug!(bytes = bytes.len(), "loaded source image");
        let img = image::load_from_memory(&bytes)?;
        encode_png_data_uri(&matte(&img, params))
    }
}
