use std::sync::Mutex;

use super::*;

/// Env mutation is process-wide; config tests take turns.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 10] = [
    "PORT",
    "MERMAID_LIVE_DIR",
    "DEBOUNCE_MS",
    "MIN_ZOOM",
    "MAX_ZOOM",
    "ZOOM_STEP",
    "SETTINGS_PATH",
    "MMDC_PATH",
    "RASTER_TIMEOUT_MS",
    "RASTER_MAX_DIMENSION",
];

/// # Safety
/// Caller must hold `ENV_LOCK`.
unsafe fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
fn from_env_defaults() {
    let _env = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_env() };

    let cfg = EditorConfig::from_env().unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.root_dir, PathBuf::from("."));
    assert_eq!(cfg.debounce, Duration::from_millis(300));
    assert_eq!(cfg.zoom, ZoomBounds { min: 25, max: 200, step: 25 });
    assert_eq!(cfg.settings_path, PathBuf::from(DEFAULT_SETTINGS_PATH));
    assert_eq!(cfg.mmdc_path, PathBuf::from("mmdc"));
    assert_eq!(cfg.raster_timeout, Duration::from_secs(10));
    assert_eq!(cfg.raster_max_dimension, 16_384);
}

#[test]
fn from_env_parses_overrides() {
    let _env = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("MERMAID_LIVE_DIR", "/srv/diagrams");
        std::env::set_var("DEBOUNCE_MS", " 150 ");
        std::env::set_var("MIN_ZOOM", "50");
        std::env::set_var("MAX_ZOOM", "300");
        std::env::set_var("ZOOM_STEP", "50");
        std::env::set_var("MMDC_PATH", "/opt/mmdc/bin/mmdc");
        std::env::set_var("RASTER_TIMEOUT_MS", "2500");
    }

    let cfg = EditorConfig::from_env().unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.root_dir, PathBuf::from("/srv/diagrams"));
    assert_eq!(cfg.debounce, Duration::from_millis(150));
    assert_eq!(cfg.zoom, ZoomBounds { min: 50, max: 300, step: 50 });
    assert_eq!(cfg.mmdc_path, PathBuf::from("/opt/mmdc/bin/mmdc"));
    assert_eq!(cfg.raster_timeout, Duration::from_millis(2500));

    let options = cfg.editor_options();
    assert_eq!(options.debounce, cfg.debounce);
    assert_eq!(options.zoom, cfg.zoom);

    unsafe { clear_env() };
}

#[test]
fn unparseable_numbers_fall_back_to_defaults() {
    let _env = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("DEBOUNCE_MS", "-5");
    }

    let cfg = EditorConfig::from_env().unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.debounce, Duration::from_millis(DEFAULT_DEBOUNCE_MS));

    unsafe { clear_env() };
}

#[test]
fn inconsistent_zoom_bounds_are_rejected() {
    let _env = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    for (min, max, step) in [("150", "200", "25"), ("25", "75", "25"), ("25", "200", "0"), ("30", "200", "25")] {
        unsafe {
            clear_env();
            std::env::set_var("MIN_ZOOM", min);
            std::env::set_var("MAX_ZOOM", max);
            std::env::set_var("ZOOM_STEP", step);
        }
        let err = EditorConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidZoom { .. }), "{min}/{max}/{step}");
    }

    unsafe { clear_env() };
}
