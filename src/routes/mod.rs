//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the JSON API, the export downloads, the
//! websocket event stream and a static-file fallback for the browser UI.
//! Unknown paths fall through to `index.html` in the serving directory.
//!
//! ERROR HANDLING
//! ==============
//! Handlers map service errors to a status with `*_to_status` helpers and
//! answer with `{ "error": message, "code": code }`.

pub mod editor;
pub mod export;
pub mod files;
pub mod render;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::frame::ErrorCode;
use crate::state::AppState;

// =============================================================================
// API ERROR
// =============================================================================

/// JSON error body with the status it is sent under.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: Option<&'static str>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, code: None, message: message.into() }
    }

    pub fn from_err(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, code: Some(err.error_code()), message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message, "code": self.code });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ROUTER
// =============================================================================

/// API routes plus the static UI fallback.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let root = state.files.root().to_path_buf();
    let static_files = ServeDir::new(&root)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(root.join("index.html")));

    Router::new()
        .route("/api/files", get(files::list_files))
        .route("/api/load/{filename}", get(files::load_file))
        .route("/api/save/{filename}", post(files::save_file))
        .route("/api/render", post(render::render_html))
        .route("/api/templates", get(editor::list_templates))
        .route("/api/editor", get(editor::get_editor))
        .route("/api/editor/text", put(editor::put_text))
        .route("/api/editor/load", post(editor::load_text))
        .route("/api/editor/template", post(editor::load_template))
        .route("/api/editor/theme", put(editor::put_theme))
        .route("/api/editor/zoom", post(editor::adjust_zoom))
        .route("/api/editor/zoom/in", post(editor::zoom_in))
        .route("/api/editor/zoom/out", post(editor::zoom_out))
        .route("/api/editor/zoom/reset", post(editor::reset_zoom))
        .route(
            "/api/editor/fullscreen",
            post(editor::toggle_fullscreen).put(editor::fullscreen_changed),
        )
        .route("/api/export/svg", get(export::export_svg))
        .route("/api/export/png", get(export::export_png))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
