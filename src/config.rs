use std::path::PathBuf;
use std::time::Duration;

/// Deployment settings shared by the store, the matte engine's fetcher, and
/// the server.
///
/// # Fields
/// - `data_file`: JSON document holding every familiar record
/// - `owner_id`: id of the user this deployment acts on behalf of
/// - `fetch_timeout`: timeout for downloading a source image
/// - `max_image_bytes`: largest source image body accepted from the network
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_file: PathBuf,
    pub owner_id: String,
    pub fetch_timeout: Duration,
    pub max_image_bytes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_file: PathBuf::from("data/familiars.json"),
            owner_id: "local_user".to_owned(),
            fetch_timeout: Duration::from_secs(30),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Connection settings for the multimodal API.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Blank keys are treated as absent.
    pub api_key: Option<String>,
    pub api_base: String,
    pub analysis_model: String,
    pub image_model: String,
    pub analysis_timeout: Duration,
    pub generation_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta/models".to_owned(),
            analysis_model: "gemini-2.0-flash".to_owned(),
            image_model: "gemini-2.0-flash-exp-image-generation".to_owned(),
            analysis_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(90),
        }
    }
}

impl GatewayConfig {
    /// Creates a config with the default endpoints and the given key.
    pub fn with_api_key(api_key: Option<String>) -> Self {
        GatewayConfig { api_key, ..Default::default() }
    }

    /// Returns the key if one is configured and non-blank.
    pub fn credentials(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// `{api_base}/{model}:generateContent?key={key}`
    pub fn generate_content_url(&self, model: &str, key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.api_base.trim_end_matches('/'),
            model,
            key
        )
    }
}
