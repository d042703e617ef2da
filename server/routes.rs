use std::io::{Cursor, Read};

use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Status code plus JSON body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        ApiResponse { status: 200, body }
    }

    pub fn success() -> Self {
        Self::ok(json!({ "success": true }))
    }

    pub fn error(status: u16, message: impl std::fmt::Display) -> Self {
        ApiResponse { status, body: json!({ "error": message.to_string() }) }
    }

    pub fn not_found() -> Self {
        Self::error(404, "Not found")
    }
}

pub fn json_response(resp: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let bytes = resp.body.to_string().into_bytes();
    let len = bytes.len();
    Response::new(
        StatusCode(resp.status),
        vec![Header::from_bytes(b"Content-Type", b"application/json").unwrap()],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

// ---------------------------------------------------------------------------
// Routing table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Analyze,
    Generate,
    RemoveBackground,
    ListFamiliars,
    Forest,
    UserFamiliars,
    Leaderboard,
    CreateFamiliar,
    UpdateFamiliar(String),
    DeleteFamiliar(String),
    Like(String),
    SetMain(String),
    NotFound,
}

impl Route {
    pub fn resolve(method: &Method, path: &str) -> Route {
        let path = path.trim_end_matches('/');
        match (method, path) {
            (Method::Get, "") => return Route::Index,
            (Method::Post, "/api/analyze") => return Route::Analyze,
            (Method::Post, "/api/generate" | "/api/generate-image") => return Route::Generate,
            (Method::Post, "/api/remove-background") => return Route::RemoveBackground,
            (Method::Get, "/api/familiars") => return Route::ListFamiliars,
            (Method::Post, "/api/familiars") => return Route::CreateFamiliar,
            (Method::Get, "/api/familiars/forest") => return Route::Forest,
            (Method::Get, "/api/familiars/user") => return Route::UserFamiliars,
            (Method::Get, "/api/familiars/leaderboard") => return Route::Leaderboard,
            _ => {}
        }

        let Some(rest) = path.strip_prefix("/api/familiars/") else {
            return Route::NotFound;
        };
        let segments: Vec<&str> = rest.split('/').collect();
        match (method, segments.as_slice()) {
            (Method::Put, [id]) if !id.is_empty() => Route::UpdateFamiliar((*id).to_owned()),
            (Method::Delete, [id]) if !id.is_empty() => Route::DeleteFamiliar((*id).to_owned()),
            (Method::Post, [id, "like"]) if !id.is_empty() => Route::Like((*id).to_owned()),
            (Method::Post, [id, "set-main"]) if !id.is_empty() => Route::SetMain((*id).to_owned()),
            _ => Route::NotFound,
        }
    }
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Reads the request, runs the matching handler and responds with JSON.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split_once('?').map_or(url.as_str(), |(p, _)| p).to_owned();

    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let mut body: Vec<u8> = Vec::new();
    if let Err(err) = request.as_reader().read_to_end(&mut body) {
        tracing::warn!(error = %err, "failed to read request body");
        let _ = request.respond(json_response(ApiResponse::error(400, "Unreadable request body")));
        return;
    }

    let route = Route::resolve(&method, &path);
    tracing::debug!(%method, %path, ?route, "request");

    let response = match route {
        // ── Status ───────────────────────────────────────────────────────
        Route::Index => handlers::index::handle_get(&state),

        // ── AI and imaging ───────────────────────────────────────────────
        Route::Analyze          => handlers::analysis::handle_analyze(&state, &content_type, &body),
        Route::Generate         => handlers::analysis::handle_generate(&state, &body),
        Route::RemoveBackground => handlers::analysis::handle_remove_background(&state, &body),

        // ── Familiars ────────────────────────────────────────────────────
        Route::ListFamiliars      => handlers::familiars::handle_list(&state),
        Route::Forest             => handlers::familiars::handle_forest(&state),
        Route::UserFamiliars      => handlers::familiars::handle_user(&state),
        Route::Leaderboard        => handlers::familiars::handle_leaderboard(&state),
        Route::CreateFamiliar     => handlers::familiars::handle_create(&state, &body),
        Route::UpdateFamiliar(id) => handlers::familiars::handle_update(&state, &id, &body),
        Route::DeleteFamiliar(id) => handlers::familiars::handle_delete(&state, &id),
        Route::Like(id)           => handlers::familiars::handle_like(&state, &id, &body),
        Route::SetMain(id)        => handlers::familiars::handle_set_main(&state, &id),

        // ── 404 ──────────────────────────────────────────────────────────
        Route::NotFound => ApiResponse::not_found(),
    };

    if response.status >= 500 {
        tracing::error!(%method, %path, status = response.status, "request failed");
    }
    let _ = request.respond(json_response(response));
}
