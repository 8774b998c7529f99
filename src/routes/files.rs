//! Diagram file routes for the serving directory.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::routes::{ApiError, ApiResult};
use crate::services::files::FileError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

#[derive(Serialize)]
pub struct FileContentResponse {
    pub content: String,
}

#[derive(Deserialize)]
pub struct SaveFileBody {
    pub content: String,
}

/// `GET /api/files` — diagram files in the serving directory.
pub async fn list_files(State(state): State<AppState>) -> ApiResult<Json<FileListResponse>> {
    let files = state.files.list().await.map_err(file_error)?;
    Ok(Json(FileListResponse { files }))
}

/// `GET /api/load/{filename}`
pub async fn load_file(State(state): State<AppState>, Path(filename): Path<String>) -> ApiResult<Json<FileContentResponse>> {
    let content = state.files.load(&filename).await.map_err(file_error)?;
    Ok(Json(FileContentResponse { content }))
}

/// `POST /api/save/{filename}`
pub async fn save_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Json(body): Json<SaveFileBody>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .files
        .save(&filename, &body.content)
        .await
        .map_err(file_error)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub(crate) fn file_error_to_status(err: &FileError) -> StatusCode {
    match err {
        FileError::InvalidName => StatusCode::BAD_REQUEST,
        FileError::NotFound => StatusCode::NOT_FOUND,
        FileError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn file_error(err: FileError) -> ApiError {
    if let FileError::Io(e) = &err {
        warn!(error = %e, "diagram file operation failed");
    }
    ApiError::from_err(file_error_to_status(&err), &err)
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
