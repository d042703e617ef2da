use serde::Deserialize;
use serde_json::{json, Value};

/// Subset of a `generateContent` response that the gateway reads.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
    #[serde(rename = "inlineData")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType", default = "default_image_mime")]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

fn default_image_mime() -> String {
    "image/png".to_owned()
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .first()?
            .text
            .as_deref()
    }

    /// First inline payload with non-empty data in the first candidate.
    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .parts
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| !d.data.is_empty())
    }
}

/// Request body asking the model to describe an inline image as JSON.
pub fn analysis_request(mime_type: &str, image_base64: &str, prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "inlineData": { "mimeType": mime_type, "data": image_base64 } },
                { "text": prompt }
            ]
        }],
        "generationConfig": { "responseMimeType": "application/json" }
    })
}

/// Request body asking the model for an image (plus optional text).
pub fn image_request(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
    })
}
