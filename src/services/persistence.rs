//! Persistence service — durable key/value settings.
//!
//! DESIGN
//! ======
//! `KeyValueStore` is the minimal get/set contract of a browser-style local
//! store. `JsonFileStore` backs it with a single JSON object on disk,
//! rewritten through a temp file + rename on every `set` so a crash never
//! leaves a half-written file behind.
//!
//! ERROR HANDLING
//! ==============
//! The settings file is a convenience cache, not a system of record.
//! `PersistenceAdapter` logs write failures and carries on; an unreadable
//! file on startup is treated as empty.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::services::templates;
use crate::services::themes::Theme;

pub const TEXT_KEY: &str = "mermaid-editor-code";
pub const THEME_KEY: &str = "mermaid-editor-theme";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("settings write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("settings store lock poisoned")]
    Poisoned,
}

// =============================================================================
// STORE
// =============================================================================

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Write through immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// File-backed store holding one flat JSON object.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or unreadable file yields an empty store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "settings file unreadable; starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings file unreadable; starting empty");
                BTreeMap::new()
            }
        };
        info!(path = %path.display(), keys = entries.len(), "settings store opened");
        Self { path, entries: Mutex::new(entries) }
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<(), PersistError> {
        let encoded = serde_json::to_vec_pretty(entries)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&encoded)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut entries = self.entries.lock().map_err(|_| PersistError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_file(&entries)
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

/// Settings restored at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSettings {
    pub last_text: String,
    pub theme: Theme,
}

#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read settings once, falling back to the default template and theme.
    #[must_use]
    pub fn load(&self) -> PersistedSettings {
        let last_text = self
            .store
            .get(TEXT_KEY)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| templates::default_text().to_owned());
        let theme = match self.store.get(THEME_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "persisted theme ignored");
                Theme::default()
            }),
            None => Theme::default(),
        };
        PersistedSettings { last_text, theme }
    }

    pub fn save_text(&self, text: &str) {
        if let Err(e) = self.store.set(TEXT_KEY, text) {
            warn!(error = %e, bytes = text.len(), "persisting editor text failed");
        }
    }

    pub fn save_theme(&self, theme: Theme) {
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
            warn!(error = %e, %theme, "persisting theme failed");
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
