//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the handle to the single editor session, the diagram file store
//! for the serving directory and the shared rasterizer. Everything inside
//! is cheap to clone.

use std::sync::Arc;

use crate::services::editor::EditorHandle;
use crate::services::export::Rasterizer;
use crate::services::files::DiagramFiles;

#[derive(Clone)]
pub struct AppState {
    pub editor: EditorHandle,
    pub files: DiagramFiles,
    pub rasterizer: Arc<Rasterizer>,
}

impl AppState {
    #[must_use]
    pub fn new(editor: EditorHandle, files: DiagramFiles, rasterizer: Rasterizer) -> Self {
        Self { editor, files, rasterizer: Arc::new(rasterizer) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
