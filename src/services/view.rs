//! View state — zoom level and fullscreen flag.
//!
//! DESIGN
//! ======
//! Zoom is kept as an integer percentage on a grid of `step` around 100 and
//! clamped into `[min, max]`. The visual transform is a pure function of the
//! current percentage, so re-applying it after every render never
//! accumulates scale.
//!
//! The fullscreen flag flips on request, but the host's own fullscreen
//! notifications are authoritative: `fullscreen_changed` overwrites the flag
//! with whatever the client actually achieved.

use serde::Serialize;

pub const DEFAULT_ZOOM: u32 = 100;
pub const DEFAULT_MIN_ZOOM: u32 = 25;
pub const DEFAULT_MAX_ZOOM: u32 = 200;
pub const DEFAULT_ZOOM_STEP: u32 = 25;

// =============================================================================
// ZOOM BOUNDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoomBounds {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self { min: DEFAULT_MIN_ZOOM, max: DEFAULT_MAX_ZOOM, step: DEFAULT_ZOOM_STEP }
    }
}

impl ZoomBounds {
    /// Bounds are usable when 100 lies inside them and both ends sit on the
    /// step grid anchored at 100.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.step > 0
            && self.min > 0
            && self.min <= DEFAULT_ZOOM
            && self.max >= DEFAULT_ZOOM
            && (DEFAULT_ZOOM - self.min) % self.step == 0
            && (self.max - DEFAULT_ZOOM) % self.step == 0
    }

    /// Round `percent` to the nearest grid point, then clamp.
    fn snap(&self, percent: i64) -> u32 {
        let step = i64::from(self.step.max(1));
        let offset = percent - i64::from(DEFAULT_ZOOM);
        let snapped = (offset * 2 + step).div_euclid(2 * step) * step + i64::from(DEFAULT_ZOOM);
        let clamped = snapped.clamp(i64::from(self.min), i64::from(self.max));
        u32::try_from(clamped).unwrap_or(DEFAULT_ZOOM)
    }
}

// =============================================================================
// ZOOM TRANSFORM
// =============================================================================

/// Visual scale applied to the displayed artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoomTransform {
    pub percent: u32,
    pub scale: f64,
    /// CSS `transform` value, e.g. `scale(1.75)`.
    pub css: String,
    /// Zoom indicator text, e.g. `175%`.
    pub label: String,
}

// =============================================================================
// VIEW STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewState {
    zoom_percent: u32,
    is_fullscreen: bool,
    #[serde(skip)]
    bounds: ZoomBounds,
}

impl ViewState {
    #[must_use]
    pub fn new(bounds: ZoomBounds) -> Self {
        Self { zoom_percent: DEFAULT_ZOOM, is_fullscreen: false, bounds }
    }

    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        self.zoom_percent
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    #[must_use]
    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    /// Move zoom by `delta` percentage points. Returns the new percentage.
    pub fn adjust_zoom(&mut self, delta: i32) -> u32 {
        self.zoom_percent = self
            .bounds
            .snap(i64::from(self.zoom_percent) + i64::from(delta));
        self.zoom_percent
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_percent = DEFAULT_ZOOM;
    }

    /// Transform for the current zoom. Idempotent.
    #[must_use]
    pub fn apply_zoom(&self) -> ZoomTransform {
        let scale = f64::from(self.zoom_percent) / 100.0;
        ZoomTransform {
            percent: self.zoom_percent,
            scale,
            css: format!("scale({scale})"),
            label: format!("{}%", self.zoom_percent),
        }
    }

    /// Flip the flag and return the state the client should now request.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.is_fullscreen = !self.is_fullscreen;
        self.is_fullscreen
    }

    /// Record the fullscreen state the host actually reached.
    pub fn fullscreen_changed(&mut self, active: bool) {
        self.is_fullscreen = active;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(ZoomBounds::default())
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
