//! Export pipeline — SVG download and supersampled PNG rasterization.
//!
//! DESIGN
//! ======
//! Both exports read the last successfully displayed artifact and never
//! touch the render path. Vector export copies the markup verbatim. Raster
//! export parses the markup with `usvg`, paints it with `resvg` onto a white
//! `tiny-skia` pixmap at twice the natural size, and encodes PNG.
//!
//! ERROR HANDLING
//! ==============
//! Parsing and painting are CPU-bound and run on the blocking pool under a
//! deadline. A markup that fails to decode, produces an empty or oversized
//! surface, or exceeds the deadline yields an error and no bytes at all.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

pub const SVG_FILENAME: &str = "mermaid-diagram.svg";
pub const PNG_FILENAME: &str = "mermaid-diagram.png";
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Raster output is rendered at this multiple of the natural size.
pub const SUPERSAMPLE: f32 = 2.0;

pub const DEFAULT_RASTER_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_RASTER_MAX_DIMENSION: u32 = 16_384;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No diagram to export")]
    NoArtifact,

    #[error("rasterization failed: {0}")]
    Rasterization(String),

    #[error("rasterization timed out after {timeout_ms}ms")]
    RasterTimeout { timeout_ms: u64 },
}

impl crate::frame::ErrorCode for ExportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoArtifact => "E_NO_ARTIFACT",
            Self::Rasterization(_) => "E_RASTERIZATION",
            Self::RasterTimeout { .. } => "E_RASTER_TIMEOUT",
        }
    }
}

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

// =============================================================================
// VECTOR
// =============================================================================

/// Serialize the displayed artifact verbatim.
///
/// # Errors
///
/// Returns `ExportError::NoArtifact` when nothing has been rendered.
pub fn export_vector(artifact: Option<&Arc<str>>) -> Result<ExportFile, ExportError> {
    let artifact = artifact.ok_or(ExportError::NoArtifact)?;
    Ok(ExportFile { filename: SVG_FILENAME, content_type: SVG_CONTENT_TYPE, bytes: artifact.as_bytes().to_vec() })
}

// =============================================================================
// RASTER
// =============================================================================

#[derive(Clone)]
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
    timeout: Duration,
    max_dimension: u32,
}

impl Rasterizer {
    /// Rasterizer with an empty font database; text renders only once fonts
    /// are added via [`Rasterizer::with_system_fonts`].
    #[must_use]
    pub fn new(timeout: Duration, max_dimension: u32) -> Self {
        Self { fontdb: Arc::new(usvg::fontdb::Database::new()), timeout, max_dimension }
    }

    #[must_use]
    pub fn with_system_fonts(mut self) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        info!(faces = db.len(), "rasterizer fonts loaded");
        self.fontdb = Arc::new(db);
        self
    }

    /// Rasterize the displayed artifact to PNG.
    ///
    /// # Errors
    ///
    /// `NoArtifact` when nothing has been rendered, `Rasterization` when the
    /// markup cannot be decoded or encoded, `RasterTimeout` when the work
    /// exceeds the configured deadline.
    pub async fn export_raster(&self, artifact: Option<Arc<str>>) -> Result<ExportFile, ExportError> {
        let artifact = artifact.ok_or(ExportError::NoArtifact)?;
        let started = Instant::now();
        let fontdb = Arc::clone(&self.fontdb);
        let max_dimension = self.max_dimension;

        let job = tokio::task::spawn_blocking(move || rasterize(&artifact, fontdb, max_dimension));
        let bytes = match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => return Err(ExportError::Rasterization(format!("raster task failed: {e}"))),
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "raster export timed out");
                return Err(ExportError::RasterTimeout { timeout_ms });
            }
        };

        info!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            png_bytes = bytes.len(),
            "raster export complete"
        );
        Ok(ExportFile { filename: PNG_FILENAME, content_type: PNG_CONTENT_TYPE, bytes })
    }
}

/// Decode `svg`, paint it white-backed at `SUPERSAMPLE`×, encode PNG.
fn rasterize(svg: &str, fontdb: Arc<usvg::fontdb::Database>, max_dimension: u32) -> Result<Vec<u8>, ExportError> {
    let options = usvg::Options { fontdb, ..usvg::Options::default() };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &options)
        .map_err(|e| ExportError::Rasterization(format!("decode failed: {e}")))?;

    let size = tree.size();
    let width = scaled_dimension(size.width());
    let height = scaled_dimension(size.height());
    if width == 0 || height == 0 {
        return Err(ExportError::Rasterization("diagram has no area".into()));
    }
    if width > max_dimension || height > max_dimension {
        return Err(ExportError::Rasterization(format!(
            "surface {width}x{height} exceeds {max_dimension}px limit"
        )));
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Rasterization(format!("cannot allocate {width}x{height} surface")))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::from_scale(SUPERSAMPLE, SUPERSAMPLE), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| ExportError::Rasterization(format!("encode failed: {e}")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_dimension(natural: f32) -> u32 {
    let scaled = (natural * SUPERSAMPLE).ceil();
    if scaled.is_finite() && scaled > 0.0 { scaled.min(u32::MAX as f32) as u32 } else { 0 }
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
