use std::time::Duration;

use serde_json::Value;
use ureq::Agent;

use crate::config::Settings;
use crate::error::WorkshopResult;
use crate::http::{redact, ImageFetcher, Transport};

const USER_AGENT: &str = "Mozilla/5.0";

/// Blocking HTTP client shared by the image fetcher and the AI gateway.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Clone)]
pub struct UreqClient {
    agent: Agent,
    fetch_timeout: Duration,
    max_image_bytes: u64,
}

impl UreqClient {
    pub fn new(fetch_timeout: Duration, max_image_bytes: u64) -> Self {
        UreqClient {
            agent: Agent::new_with_defaults(),
            fetch_timeout,
            max_image_bytes,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.fetch_timeout, settings.max_image_bytes)
    }
}

impl ImageFetcher for UreqClient {
    #[tracing::instrument(skip_all, fields(url = redact(url)))]
    fn fetch(&self, url: &str) -> WorkshopResult<Vec<u8>> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .config()
            .timeout_global(Some(self.fetch_timeout))
            .build()
            .call()?;
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_image_bytes)
            .read_to_vec()?;
        tracing::debug!(bytes = bytes.len(), "fetched image");
        Ok(bytes)
    }
}

impl Transport for UreqClient {
    fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> WorkshopResult<Value> {
        tracing::debug!(url = redact(url), timeout_ms = timeout.as_millis() as u64, "posting json");
        let mut response = self
            .agent
            .post(url)
            .header("Content-Type", "application/json")
            .config()
            .timeout_global(Some(timeout))
            .build()
            .send_json(payload)?;
        let body: Value = response.body_mut().read_json()?;
        Ok(body)
    }
}
