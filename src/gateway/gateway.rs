use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::Rng;

use crate::config::GatewayConfig;
use crate::error::{WorkshopError, WorkshopResult};
use crate::gateway::analysis::{Analysis, ANALYSIS_PROMPT};
use crate::gateway::generation::{familiar_prompt, placeholder_url, prompt_image_url, MAX_SEED};
use crate::gateway::wire::{analysis_request, image_request, GenerateContentResponse};
use crate::http::Transport;
use crate::matte::source::{data_uri, guess_mime};
use crate::outcome::{FallbackReason, Outcome};

/// Stateless client for the multimodal API.
///
/// Every operation answers with a value: when the key is missing or the call
/// fails, the answer is the documented fallback wrapped in
/// `Outcome::Fallback`.
pub struct AiGateway<T> {
    transport: T,
    config: GatewayConfig,
}

impl<T: Transport> AiGateway<T> {
    pub fn new(transport: T, config: GatewayConfig) -> Self {
        AiGateway { transport, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn has_credentials(&self) -> bool {
        self.config.credentials().is_some()
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Identifies the object in a photo and proposes a familiar for it.
    #[tracing::instrument(skip_all, fields(bytes = image_bytes.len()))]
    pub fn analyze(&self, image_bytes: &[u8]) -> Outcome<Analysis> {
        let Some(key) = self.config.credentials() else {
            tracing::info!("no API key configured, using fallback analysis");
            return Outcome::fallback(Analysis::fallback(), FallbackReason::Unconfigured);
        };
        match self.request_analysis(key, image_bytes) {
            Ok(analysis) => {
                tracing::info!(species = %analysis.species, "analysis complete");
                Outcome::Primary(analysis)
            }
            Err(err) => {
                tracing::warn!(error = %err, "analysis failed, using fallback");
                Outcome::fallback(Analysis::fallback(), FallbackReason::Failed(err))
            }
        }
    }

    fn request_analysis(&self, key: &str, image_bytes: &[u8]) -> WorkshopResult<Analysis> {
        let mime = guess_mime(image_bytes).unwrap_or("image/jpeg");
        let payload = analysis_request(mime, &STANDARD.encode(image_bytes), ANALYSIS_PROMPT);
        let url = self.config.generate_content_url(&self.config.analysis_model, key);
        let body = self
            .transport
            .post_json(&url, &payload, self.config.analysis_timeout)?;
        let resp: GenerateContentResponse = serde_json::from_value(body)?;
        Analysis::from_response(&resp)
    }

    // -----------------------------------------------------------------------
    // Image generation
    // -----------------------------------------------------------------------

    /// Produces an image reference for a familiar.
    ///
    /// Order: the image model (data URI), then the prompt-image redirect
    /// service with a random seed, then a placeholder keyed by species.
    pub fn generate_image(&self, species: &str, description: &str) -> Outcome<String> {
        self.generate_image_with(species, description, &mut rand::thread_rng())
    }

    #[tracing::instrument(skip(self, description, rng))]
    pub fn generate_image_with<R: Rng + ?Sized>(
        &self,
        species: &str,
        description: &str,
        rng: &mut R,
    ) -> Outcome<String> {
        let prompt = familiar_prompt(species, description);

        let reason = match self.config.credentials() {
            None => {
                tracing::info!("no API key configured, using prompt-image service");
                FallbackReason::Unconfigured
            }
            Some(key) => match self.request_image(key, &prompt) {
                Ok(uri) => {
                    tracing::info!("image generated by model");
                    return Outcome::Primary(uri);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "image generation failed, using prompt-image service");
                    FallbackReason::Failed(err)
                }
            },
        };

        let url = match prompt_image_url(&prompt, rng.gen_range(0..=MAX_SEED)) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = %err, "prompt-image service unusable, using placeholder");
                placeholder_url(species)
            }
        };
        Outcome::fallback(url, reason)
    }

    fn request_image(&self, key: &str, prompt: &str) -> WorkshopResult<String> {
        let url = self.config.generate_content_url(&self.config.image_model, key);
        let body = self
            .transport
            .post_json(&url, &image_request(prompt), self.config.generation_timeout)?;
        let resp: GenerateContentResponse = serde_json::from_value(body)?;
        let inline = resp
            .first_inline_data()
            .ok_or_else(|| WorkshopError::malformed("no image in response"))?;
        // Re-encode to validate the payload before handing it to a browser.
        let bytes = STANDARD.decode(inline.data.trim())?;
        Ok(data_uri(&inline.mime_type, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    /// Replays canned responses and records what was posted.
    struct Scripted {
        reply: RefCell<Option<WorkshopResult<Value>>>,
        calls: RefCell<Vec<(String, Value, Duration)>>,
    }

    impl Scripted {
        fn replying(reply: WorkshopResult<Value>) -> Self {
            Scripted { reply: RefCell::new(Some(reply)), calls: RefCell::new(Vec::new()) }
        }
    }

    impl Transport for Scripted {
        fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> WorkshopResult<Value> {
            self.calls.borrow_mut().push((url.to_owned(), payload.clone(), timeout));
            self.reply
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(WorkshopError::http("no scripted reply")))
        }
    }

    fn keyed(transport: Scripted) -> AiGateway<Scripted> {
        AiGateway::new(transport, GatewayConfig::with_api_key(Some("k3y".into())))
    }

    fn text_reply(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn analyze_without_key_returns_fixed_fallback_and_makes_no_call() {
        let gw = AiGateway::new(Scripted::replying(Ok(json!({}))), GatewayConfig::default());
        let out = gw.analyze(b"jpeg bytes");
        assert!(matches!(out.reason(), Some(FallbackReason::Unconfigured)));
        assert_eq!(out.into_value(), Analysis::fallback());
        assert!(gw.transport.calls.borrow().is_empty());
    }

    #[test]
    fn analyze_posts_image_and_parses_reply() {
        let gw = keyed(Scripted::replying(Ok(text_reply(
            r#"{"originalItem":"Key","species":"Brass Beetle","suggestedNames":["Tumbler","Ward","Bit"],"description":"Clicks."}"#,
        ))));
        let out = gw.analyze(b"\xFF\xD8\xFF\xE0 fake jpeg");
        assert!(!out.is_fallback());
        assert_eq!(out.value().species, "Brass Beetle");

        let calls = gw.transport.calls.borrow();
        let (url, payload, timeout) = &calls[0];
        assert!(url.ends_with("/gemini-2.0-flash:generateContent?key=k3y"));
        assert_eq!(*timeout, Duration::from_secs(30));
        let inline = &payload["contents"][0]["parts"][0]["inlineData"];
        assert_eq!(inline["data"], STANDARD.encode(b"\xFF\xD8\xFF\xE0 fake jpeg"));
    }

    #[test]
    fn analyze_network_failure_falls_back() {
        let gw = keyed(Scripted::replying(Err(WorkshopError::http("timed out"))));
        let out = gw.analyze(b"x");
        assert!(matches!(
            out.reason(),
            Some(FallbackReason::Failed(WorkshopError::Http(_)))
        ));
        assert_eq!(*out.value(), Analysis::fallback());
    }

    #[test]
    fn analyze_malformed_payload_falls_back() {
        let gw = keyed(Scripted::replying(Ok(json!({ "candidates": [] }))));
        let out = gw.analyze(b"x");
        assert!(out.is_fallback());
        assert_eq!(out.into_value(), Analysis::fallback());
    }

    #[test]
    fn generate_returns_inline_image_as_data_uri() {
        let gw = keyed(Scripted::replying(Ok(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "A fox!" },
                { "inlineData": { "mimeType": "image/webp", "data": "QUJD" } }
            ]}}]
        }))));
        let out = gw.generate_image("Fox", "Fiery");
        assert_eq!(out.into_value(), "data:image/webp;base64,QUJD");

        let calls = gw.transport.calls.borrow();
        let (url, payload, timeout) = &calls[0];
        assert!(url.contains("gemini-2.0-flash-exp-image-generation:generateContent"));
        assert_eq!(*timeout, Duration::from_secs(90));
        assert_eq!(payload["generationConfig"]["responseModalities"], json!(["TEXT", "IMAGE"]));
    }

    #[test]
    fn generate_without_key_uses_prompt_image_service() {
        let gw = AiGateway::new(Scripted::replying(Ok(json!({}))), GatewayConfig::default());
        let mut rng = StdRng::seed_from_u64(11);
        let out = gw.generate_image_with("Owl", "Wise", &mut rng);
        assert!(matches!(out.reason(), Some(FallbackReason::Unconfigured)));
        let url = out.into_value();
        assert!(url.starts_with("https://image.pollinations.ai/prompt/Generate%20an%20image"));
        assert!(url.contains("&seed="));
        assert!(gw.transport.calls.borrow().is_empty());
    }

    #[test]
    fn generate_without_image_part_falls_back() {
        let gw = keyed(Scripted::replying(Ok(text_reply("sorry, text only"))));
        let out = gw.generate_image("Owl", "Wise");
        assert!(matches!(
            out.reason(),
            Some(FallbackReason::Failed(WorkshopError::Malformed(_)))
        ));
        assert!(out.value().starts_with("https://image.pollinations.ai/prompt/"));
    }

    #[test]
    fn second_failure_lands_on_placeholder() {
        let gw = keyed(Scripted::replying(Err(WorkshopError::http("503"))));
        let description = "very long ".repeat(2000);
        let out = gw.generate_image("Moth King", &description);
        assert!(out.is_fallback());
        assert_eq!(out.into_value(), "https://picsum.photos/seed/Moth%20King/512/512");
    }
}
