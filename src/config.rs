//! Server configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::services::debounce::DEFAULT_DEBOUNCE_MS;
use crate::services::editor::EditorOptions;
use crate::services::export::{DEFAULT_RASTER_MAX_DIMENSION, DEFAULT_RASTER_TIMEOUT_MS};
use crate::services::view::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM_STEP, ZoomBounds};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SETTINGS_PATH: &str = "mermaid-live-settings.json";
pub const DEFAULT_MMDC_PATH: &str = "mmdc";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid zoom bounds: min={min} max={max} step={step} (100 must be reachable in whole steps)")]
    InvalidZoom { min: u32, max: u32, step: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub port: u16,
    /// Diagram files and static assets.
    pub root_dir: PathBuf,
    pub debounce: Duration,
    pub zoom: ZoomBounds,
    pub settings_path: PathBuf,
    pub mmdc_path: PathBuf,
    pub raster_timeout: Duration,
    pub raster_max_dimension: u32,
}

impl EditorConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `MERMAID_LIVE_DIR`: default `.`
    /// - `DEBOUNCE_MS`: default 300
    /// - `MIN_ZOOM` / `MAX_ZOOM` / `ZOOM_STEP`: default 25 / 200 / 25
    /// - `SETTINGS_PATH`: default `mermaid-live-settings.json`
    /// - `MMDC_PATH`: default `mmdc`
    /// - `RASTER_TIMEOUT_MS`: default 10000
    /// - `RASTER_MAX_DIMENSION`: default 16384
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidZoom` when 100% is outside the zoom
    /// bounds or the bounds are off the step grid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let zoom = ZoomBounds {
            min: env_parse("MIN_ZOOM", DEFAULT_MIN_ZOOM),
            max: env_parse("MAX_ZOOM", DEFAULT_MAX_ZOOM),
            step: env_parse("ZOOM_STEP", DEFAULT_ZOOM_STEP),
        };
        if !zoom.is_consistent() {
            return Err(ConfigError::InvalidZoom { min: zoom.min, max: zoom.max, step: zoom.step });
        }

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            root_dir: env_path("MERMAID_LIVE_DIR", "."),
            debounce: Duration::from_millis(env_parse("DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)),
            zoom,
            settings_path: env_path("SETTINGS_PATH", DEFAULT_SETTINGS_PATH),
            mmdc_path: env_path("MMDC_PATH", DEFAULT_MMDC_PATH),
            raster_timeout: Duration::from_millis(env_parse("RASTER_TIMEOUT_MS", DEFAULT_RASTER_TIMEOUT_MS)),
            raster_max_dimension: env_parse("RASTER_MAX_DIMENSION", DEFAULT_RASTER_MAX_DIMENSION),
        })
    }

    #[must_use]
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions { debounce: self.debounce, zoom: self.zoom }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| PathBuf::from(default), PathBuf::from)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
