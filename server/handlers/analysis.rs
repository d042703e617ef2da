use serde::Deserialize;
use serde_json::json;

use familiar_workshop::gateway::placeholder_url;
use familiar_workshop::{ImageSource, MatteParams};

use crate::handlers::json_ok;
use crate::routes::ApiResponse;
use crate::state::ServerState;
use crate::util::json::parse_body;
use crate::util::multipart::{extract_boundary, extract_file};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default = "default_species")]
    species: String,
    #[serde(default = "default_description")]
    description: String,
}

fn default_species() -> String {
    "creature".to_owned()
}

fn default_description() -> String {
    "A magical familiar".to_owned()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveBackgroundRequest {
    #[serde(default)]
    image_url: String,
    #[serde(default = "default_threshold")]
    threshold: i64,
    #[serde(default = "default_tolerance")]
    tolerance: i64,
}

fn default_threshold() -> i64 {
    MatteParams::default().threshold as i64
}

fn default_tolerance() -> i64 {
    MatteParams::default().tolerance as i64
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/analyze
///
/// Expects a multipart upload with the photo in the `image` field.
pub fn handle_analyze(state: &ServerState, content_type: &str, body: &[u8]) -> ApiResponse {
    let Some(boundary) = extract_boundary(content_type) else {
        return ApiResponse::error(400, "No image provided");
    };
    let Some(file) = extract_file(body, &boundary, "image") else {
        return ApiResponse::error(400, "No image provided");
    };
    if file.filename.is_empty() {
        return ApiResponse::error(400, "No file selected");
    }

    let analysis = state.gateway.analyze(&file.bytes).into_value();
    json_ok(&analysis)
}

/// POST /api/generate and /api/generate-image
pub fn handle_generate(state: &ServerState, body: &[u8]) -> ApiResponse {
    let req: GenerateRequest = match parse_body(body) {
        Ok(r) => r,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable generate request, using placeholder");
            return ApiResponse::ok(json!({ "imageUrl": placeholder_url(&default_species()) }));
        }
    };

    let url = state.gateway.generate_image(&req.species, &req.description).into_value();
    ApiResponse::ok(json!({ "imageUrl": url }))
}

/// POST /api/remove-background
pub fn handle_remove_background(state: &ServerState, body: &[u8]) -> ApiResponse {
    let req: RemoveBackgroundRequest = match parse_body(body) {
        Ok(r) => r,
        Err(err) => return ApiResponse::error(400, format!("Invalid JSON: {err}")),
    };
    if req.image_url.is_empty() {
        return ApiResponse::error(400, "No image URL provided");
    }

    let params = MatteParams::from_request(req.threshold, req.tolerance);
    let source = ImageSource::parse(&req.image_url);
    let url = state.matte.remove_background(&source, &params).into_value();
    ApiResponse::ok(json!({ "imageUrl": url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::offline_state;
    use familiar_workshop::matte::encode_png_data_uri;
    use familiar_workshop::matte::source::decode_data_uri;
    use image::{Rgba, RgbaImage};

    fn multipart(filename: &str, data: &[u8]) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(
            format!(
                "--B\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\r\n"
            )
            .as_bytes(),
        );
        b.extend_from_slice(data);
        b.extend_from_slice(b"\r\n--B--\r\n");
        b
    }

    const CT: &str = "multipart/form-data; boundary=B";

    #[test]
    fn analyze_without_upload_is_rejected() {
        let (_dir, state) = offline_state();
        let resp = handle_analyze(&state, "application/json", b"{}");
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["error"], "No image provided");

        let resp = handle_analyze(&state, CT, &multipart("", b""));
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["error"], "No file selected");
    }

    #[test]
    fn analyze_offline_returns_fallback_analysis() {
        let (_dir, state) = offline_state();
        let resp = handle_analyze(&state, CT, &multipart("mug.jpg", &[0xFF, 0xD8, 0xFF]));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["originalItem"], "Mystery Object");
        assert_eq!(resp.body["species"], "Shadow Creature");
        assert_eq!(resp.body["suggestedNames"], json!(["Umbra", "Shade", "Echo"]));
    }

    #[test]
    fn generate_offline_points_at_prompt_service() {
        let (_dir, state) = offline_state();
        let resp = handle_generate(&state, br#"{"species": "Ember Fox"}"#);
        assert_eq!(resp.status, 200);
        let url = resp.body["imageUrl"].as_str().unwrap();
        assert!(url.starts_with("https://image.pollinations.ai/prompt/"));
        assert!(url.contains("Ember%20Fox"));
    }

    #[test]
    fn generate_with_bad_json_uses_placeholder() {
        let (_dir, state) = offline_state();
        let resp = handle_generate(&state, b"not json");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["imageUrl"], placeholder_url("creature"));
    }

    #[test]
    fn remove_background_requires_url() {
        let (_dir, state) = offline_state();
        let resp = handle_remove_background(&state, br#"{"threshold": 200}"#);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["error"], "No image URL provided");
    }

    #[test]
    fn remove_background_clears_white_data_uri() {
        let (_dir, state) = offline_state();
        let white = encode_png_data_uri(&RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])))
            .unwrap();
        let body = json!({ "imageUrl": white, "threshold": 999, "tolerance": -5 }).to_string();

        let resp = handle_remove_background(&state, body.as_bytes());
        assert_eq!(resp.status, 200);
        let out = resp.body["imageUrl"].as_str().unwrap();
        let bytes = decode_data_uri(out).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        // threshold clamps to 255, which no channel can exceed
        assert!(img.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn remove_background_echoes_unusable_input() {
        let (_dir, state) = offline_state();
        let body = json!({ "imageUrl": "data:image/png;base64,AAAA" }).to_string();
        let resp = handle_remove_background(&state, body.as_bytes());
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["imageUrl"], "data:image/png;base64,AAAA");
    }
}
