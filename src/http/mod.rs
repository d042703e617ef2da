pub mod client;

use std::time::Duration;

use serde_json::Value;

use crate::error::WorkshopResult;

pub use client::UreqClient;

/// Downloads the encoded bytes behind an image URL.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> WorkshopResult<Vec<u8>>;
}

/// Posts a JSON payload and returns the decoded JSON response body.
///
/// Non-2xx statuses, timeouts and unparseable bodies are all errors.
pub trait Transport {
    fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> WorkshopResult<Value>;
}

impl<T: ImageFetcher + ?Sized> ImageFetcher for &T {
    fn fetch(&self, url: &str) -> WorkshopResult<Vec<u8>> {
        (**self).fetch(url)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> WorkshopResult<Value> {
        (**self).post_json(url, payload, timeout)
    }
}

/// Strips the query string so that credentials never reach the logs.
pub(crate) fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
