pub mod analysis;
pub mod familiars;
pub mod index;

use serde::Serialize;
use serde_json::Value;

use crate::routes::ApiResponse;

/// Serializes a handler result into a 200 response.
pub(crate) fn json_ok<T: Serialize>(value: &T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(body) => ApiResponse::ok(body),
        Err(err) => ApiResponse::error(500, err),
    }
}

/// Merges `{"success": true}` with the fields of `extra`.
pub(crate) fn success_with(extra: Value) -> ApiResponse {
    let mut body = serde_json::Map::new();
    body.insert("success".to_owned(), Value::Bool(true));
    if let Value::Object(fields) = extra {
        body.extend(fields);
    }
    ApiResponse::ok(Value::Object(body))
}
