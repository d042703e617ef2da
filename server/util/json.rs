use serde::de::DeserializeOwned;

/// Parses a JSON request body. An empty body is read as `{}` so that every
/// field falls back to its default.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(b"{}");
    }
    serde_json::from_slice(body)
}
