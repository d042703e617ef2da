use serde::Deserialize;
use serde_json::json;

use familiar_workshop::{FamiliarPatch, NewFamiliar, Vote};

use crate::handlers::{json_ok, success_with};
use crate::routes::ApiResponse;
use crate::state::ServerState;
use crate::util::json::parse_body;

#[derive(Debug, Deserialize)]
struct LikeRequest {
    #[serde(default = "default_vote")]
    value: i64,
}

fn default_vote() -> i64 {
    1
}

fn bad_json(err: serde_json::Error) -> ApiResponse {
    ApiResponse::error(400, format!("Invalid JSON: {err}"))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/familiars
pub fn handle_list(state: &ServerState) -> ApiResponse {
    json_ok(&state.store().all())
}

/// GET /api/familiars/forest
pub fn handle_forest(state: &ServerState) -> ApiResponse {
    let familiars = state.store().forest(&mut rand::thread_rng());
    json_ok(&familiars)
}

/// GET /api/familiars/user
pub fn handle_user(state: &ServerState) -> ApiResponse {
    json_ok(&state.store().by_owner(&state.owner_id))
}

/// GET /api/familiars/leaderboard
pub fn handle_leaderboard(state: &ServerState) -> ApiResponse {
    json_ok(&state.store().leaderboard())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/familiars
pub fn handle_create(state: &ServerState, body: &[u8]) -> ApiResponse {
    let new: NewFamiliar = match parse_body(body) {
        Ok(n) => n,
        Err(err) => return bad_json(err),
    };
    let result = state.store().summon(new, &state.owner_id, &mut rand::thread_rng());
    match result {
        Ok(familiar) => success_with(json!({ "familiar": familiar })),
        Err(err) => ApiResponse::error(500, err),
    }
}

/// PUT /api/familiars/{id}
pub fn handle_update(state: &ServerState, id: &str, body: &[u8]) -> ApiResponse {
    let patch: FamiliarPatch = match parse_body(body) {
        Ok(p) => p,
        Err(err) => return bad_json(err),
    };
    match state.store().update(id, patch) {
        Ok(_) => ApiResponse::success(),
        Err(err) => ApiResponse::error(500, err),
    }
}

/// POST /api/familiars/{id}/like
pub fn handle_like(state: &ServerState, id: &str, body: &[u8]) -> ApiResponse {
    let req: LikeRequest = match parse_body(body) {
        Ok(r) => r,
        Err(err) => return bad_json(err),
    };
    let result = state.store().vote(id, Vote::from_value(req.value));
    match result {
        Ok(Some(tally)) => success_with(json!(tally)),
        Ok(None) => ApiResponse::error(404, "Familiar not found"),
        Err(err) => ApiResponse::error(500, err),
    }
}

/// POST /api/familiars/{id}/set-main
pub fn handle_set_main(state: &ServerState, id: &str) -> ApiResponse {
    match state.store().set_main(&state.owner_id, id) {
        Ok(_) => ApiResponse::success(),
        Err(err) => ApiResponse::error(500, err),
    }
}

/// DELETE /api/familiars/{id}
pub fn handle_delete(state: &ServerState, id: &str) -> ApiResponse {
    match state.store().delete(id) {
        Ok(_) => ApiResponse::success(),
        Err(err) => ApiResponse::error(500, err),
    }
}
