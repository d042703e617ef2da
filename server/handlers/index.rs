use serde_json::json;

use crate::routes::ApiResponse;
use crate::state::ServerState;

/// GET /
pub fn handle_get(state: &ServerState) -> ApiResponse {
    ApiResponse::ok(json!({
        "name": env!("CARGO_PKG_NAME"),
        "hasApiKey": state.gateway.has_credentials(),
    }))
}
