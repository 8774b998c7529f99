//! Render-to-HTML endpoint for external tools.
//!
//! Wraps arbitrary diagram text in a standalone page that loads Mermaid
//! from a CDN and renders on load. Stateless; the live session is not
//! touched.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use serde::Deserialize;
use tracing::error;

use crate::routes::{ApiError, ApiResult};

const MERMAID_CDN: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

#[derive(Deserialize)]
pub struct RenderBody {
    #[serde(default)]
    pub code: Option<String>,
}

/// Standalone page; `code` is HTML-escaped on render.
#[derive(Template)]
#[template(path = "standalone.html")]
struct StandalonePage<'a> {
    script_src: &'a str,
    code: &'a str,
}

/// `POST /api/render` — standalone HTML embedding `code`.
pub async fn render_html(Json(body): Json<RenderBody>) -> ApiResult<Html<String>> {
    let code = body
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "No code provided"))?;
    let page = standalone_page(&code).map_err(|e| {
        error!(error = %e, "standalone page rendering failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Template rendering failed")
    })?;
    Ok(Html(page))
}

pub(crate) fn standalone_page(code: &str) -> Result<String, askama::Error> {
    StandalonePage { script_src: MERMAID_CDN, code }.render()
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
