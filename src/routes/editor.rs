//! Editor session routes — HTTP front door to the live session.
//!
//! Every mutating route answers with the session snapshot taken right
//! after the command was applied. Render outcomes arrive asynchronously;
//! clients poll `GET /api/editor` or follow the websocket stream.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::routes::{ApiError, ApiResult};
use crate::services::editor::{EditorError, EditorSnapshot};
use crate::services::export::ExportError;
use crate::services::templates;
use crate::services::themes::Theme;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TextBody {
    pub text: String,
}

#[derive(Deserialize)]
pub struct TemplateBody {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ThemeBody {
    pub theme: String,
}

#[derive(Deserialize)]
pub struct ZoomBody {
    pub delta: i32,
}

#[derive(Deserialize)]
pub struct FullscreenBody {
    pub active: bool,
}

type SnapshotResult = ApiResult<Json<EditorSnapshot>>;

/// `GET /api/templates` — template names in picker order.
pub async fn list_templates() -> Json<serde_json::Value> {
    let names: Vec<&str> = templates::names().collect();
    Json(serde_json::json!({ "templates": names }))
}

/// `GET /api/editor`
pub async fn get_editor(State(state): State<AppState>) -> SnapshotResult {
    respond(state.editor.snapshot().await)
}

/// `PUT /api/editor/text` — keystroke-style edit, debounced.
pub async fn put_text(State(state): State<AppState>, Json(body): Json<TextBody>) -> SnapshotResult {
    respond(state.editor.edit(body.text).await)
}

/// `POST /api/editor/load` — replace the text and render now.
pub async fn load_text(State(state): State<AppState>, Json(body): Json<TextBody>) -> SnapshotResult {
    respond(state.editor.load(body.text).await)
}

/// `POST /api/editor/template`
pub async fn load_template(State(state): State<AppState>, Json(body): Json<TemplateBody>) -> SnapshotResult {
    respond(state.editor.load_template(&body.name).await)
}

/// `PUT /api/editor/theme`
pub async fn put_theme(State(state): State<AppState>, Json(body): Json<ThemeBody>) -> SnapshotResult {
    let theme: Theme = body
        .theme
        .parse()
        .map_err(|e| ApiError::from_err(StatusCode::BAD_REQUEST, &e))?;
    respond(state.editor.set_theme(theme).await)
}

/// `POST /api/editor/zoom`
pub async fn adjust_zoom(State(state): State<AppState>, Json(body): Json<ZoomBody>) -> SnapshotResult {
    respond(state.editor.adjust_zoom(body.delta).await)
}

/// `POST /api/editor/zoom/in` — one zoom step up.
pub async fn zoom_in(State(state): State<AppState>) -> SnapshotResult {
    respond(state.editor.zoom_in().await)
}

/// `POST /api/editor/zoom/out`
pub async fn zoom_out(State(state): State<AppState>) -> SnapshotResult {
    respond(state.editor.zoom_out().await)
}

/// `POST /api/editor/zoom/reset`
pub async fn reset_zoom(State(state): State<AppState>) -> SnapshotResult {
    respond(state.editor.reset_zoom().await)
}

/// `POST /api/editor/fullscreen` — toggle and ask clients to follow.
pub async fn toggle_fullscreen(State(state): State<AppState>) -> SnapshotResult {
    respond(state.editor.toggle_fullscreen().await)
}

/// `PUT /api/editor/fullscreen` — the fullscreen state a client reached.
pub async fn fullscreen_changed(State(state): State<AppState>, Json(body): Json<FullscreenBody>) -> SnapshotResult {
    respond(state.editor.fullscreen_changed(body.active).await)
}

fn respond(result: Result<EditorSnapshot, EditorError>) -> SnapshotResult {
    result
        .map(Json)
        .map_err(|e| ApiError::from_err(editor_error_to_status(&e), &e))
}

pub(crate) fn editor_error_to_status(err: &EditorError) -> StatusCode {
    match err {
        EditorError::UnknownTemplate(_) => StatusCode::NOT_FOUND,
        EditorError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        EditorError::Export(ExportError::NoArtifact) => StatusCode::CONFLICT,
        EditorError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
