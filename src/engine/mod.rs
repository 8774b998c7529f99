//! Engine — adapter seam for the external Mermaid renderer.
//!
//! DESIGN
//! ======
//! Parsing and layout belong to the renderer, not to this crate. The editor
//! only sees `RenderEngine`: re-initialize with `configure` (theme changes),
//! then `render` a source text under a caller-chosen unique id. `MmdcEngine`
//! drives the Mermaid CLI; tests plug in scripted engines.

pub mod mmdc;

pub use mmdc::MmdcEngine;

use crate::services::themes::Theme;

// =============================================================================
// ERROR
// =============================================================================

/// Every variant is a recoverable render failure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The renderer rejected the diagram text.
    #[error("{message}")]
    Syntax { message: String },

    /// The renderer could not be started.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    #[error("renderer I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl crate::frame::ErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "E_SYNTAX",
            Self::Unavailable(_) => "E_RENDERER_UNAVAILABLE",
            Self::Io(_) => "E_RENDERER_IO",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineSettings {
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMarkup {
    pub svg: String,
}

#[async_trait::async_trait]
pub trait RenderEngine: Send + Sync {
    /// Apply settings to every render started after this call.
    fn configure(&self, settings: EngineSettings);

    /// Render `source` to SVG. `render_id` must be unique per call.
    async fn render(&self, render_id: &str, source: &str) -> Result<RenderedMarkup, EngineError>;
}

// =============================================================================
// TEST HELPERS
// =============================================================================
