use crate::error::{WorkshopError, WorkshopResult};

const PROMPT_IMAGE_BASE: &str = "https://image.pollinations.ai/prompt";
const PLACEHOLDER_BASE: &str = "https://picsum.photos/seed";

/// Longest prompt-image URL the redirect service accepts.
pub const MAX_PROMPT_URL_LEN: usize = 8000;

/// Upper bound (inclusive) of the random seed sent to the prompt-image service.
pub const MAX_SEED: u32 = 1_000_000;

/// Prompt sent to every image generator.
pub fn familiar_prompt(species: &str, description: &str) -> String {
    format!(
        "Generate an image of: A high quality, magical 2D game asset art of a {species}.\n\
         Description: {description}.\n\
         Style: Cute, mystical, vibrant colors, fantasy art style, stickers, white background.\n\
         The creature should look like a familiar companion."
    )
}

/// First fallback: a redirect URL that renders the prompt on demand.
///
/// Fails for a blank prompt or when the URL would be too long to serve.
pub fn prompt_image_url(prompt: &str, seed: u32) -> WorkshopResult<String> {
    if prompt.trim().is_empty() {
        return Err(WorkshopError::validation("prompt is empty"));
    }
    let url = format!(
        "{}/{}?width=512&height=512&seed={}&nologo=true",
        PROMPT_IMAGE_BASE,
        quote(prompt),
        seed
    );
    if url.len() > MAX_PROMPT_URL_LEN {
        return Err(WorkshopError::validation(format!(
            "prompt URL is {} bytes, limit is {}",
            url.len(),
            MAX_PROMPT_URL_LEN
        )));
    }
    Ok(url)
}

/// Last resort: a deterministic placeholder keyed by species.
pub fn placeholder_url(species: &str) -> String {
    format!("{}/{}/512/512", PLACEHOLDER_BASE, quote(species))
}

/// Percent-encodes every byte except ASCII alphanumerics and `_.-~/`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
