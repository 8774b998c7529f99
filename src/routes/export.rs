//! Export download routes.

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::routes::ApiError;
use crate::routes::editor::editor_error_to_status;
use crate::services::editor::EditorError;
use crate::services::export::ExportFile;
use crate::state::AppState;

/// `GET /api/export/svg`
pub async fn export_svg(State(state): State<AppState>) -> Result<Response, ApiError> {
    let file = state.editor.export_svg().await.map_err(export_error)?;
    Ok(attachment(file))
}

/// `GET /api/export/png`
pub async fn export_png(State(state): State<AppState>) -> Result<Response, ApiError> {
    let file = state
        .editor
        .export_png(&state.rasterizer)
        .await
        .map_err(export_error)?;
    Ok(attachment(file))
}

fn attachment(file: ExportFile) -> Response {
    info!(file = file.filename, bytes = file.bytes.len(), "export served");
    (
        [
            (CONTENT_TYPE, file.content_type.to_owned()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.filename)),
        ],
        file.bytes,
    )
        .into_response()
}

fn export_error(err: EditorError) -> ApiError {
    let status = editor_error_to_status(&err);
    if status.is_server_error() {
        warn!(error = %err, "export failed");
    }
    ApiError::from_err(status, &err)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
