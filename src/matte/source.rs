use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{WorkshopError, WorkshopResult};
use crate::http::ImageFetcher;

/// Where the encoded bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An `http://` or `https://` URL to download.
    Url(String),
    /// A `data:<mime>;base64,<payload>` URI, decoded locally.
    DataUri(String),
    /// Raw encoded image bytes.
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Interprets a reference string as either a data URI or a URL.
    ///
    /// The reference is kept verbatim so that a failure echoes exactly what
    /// the caller sent; surrounding whitespace is only ignored when loading.
    pub fn parse(reference: &str) -> Self {
        if has_data_scheme(reference.trim_start()) {
            ImageSource::DataUri(reference.to_owned())
        } else {
            ImageSource::Url(reference.to_owned())
        }
    }

    /// The string echoed back when processing fails.
    pub fn reference(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::DataUri(uri) => uri.clone(),
            ImageSource::Bytes(bytes) => {
                let mime = guess_mime(bytes).unwrap_or("application/octet-stream");
                data_uri(mime, bytes)
            }
        }
    }

    /// Produces the encoded image bytes, downloading if needed.
    pub fn load<F: ImageFetcher>(&self, fetcher: &F) -> WorkshopResult<Vec<u8>> {
        match self {
            ImageSource::Url(url) => {
                let url = url.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(WorkshopError::validation(format!(
                        "unsupported image reference: {url}"
                    )));
                }
                fetcher.fetch(url)
            }
            ImageSource::DataUri(uri) => decode_data_uri(uri.trim()),
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// `data:{mime};base64,{payload}`
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decodes the payload of a base64 data URI. Plain (non-base64) data URIs
/// are rejected; image payloads are always base64 in practice.
pub fn decode_data_uri(uri: &str) -> WorkshopResult<Vec<u8>> {
    let rest = uri
        .get(5..)
        .filter(|_| has_data_scheme(uri))
        .ok_or_else(|| WorkshopError::decode("not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| WorkshopError::decode("data URI has no payload separator"))?;
    if !meta.split(';').any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(WorkshopError::decode("data URI is not base64 encoded"));
    }
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(cleaned)?)
}

fn has_data_scheme(reference: &str) -> bool {
    reference
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Guesses an image MIME type from magic bytes.
pub fn guess_mime(bytes: &[u8]) -> Option<&'static str> {
    use image::ImageFormat;
    let mime = match image::guess_format(bytes).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::WebP => "image/webp",
        _ => return None,
    };
    Some(mime)
}
