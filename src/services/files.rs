//! Diagram file store — `.mmd` / `.mermaid` files in the serving directory.
//!
//! Only bare filenames with a diagram extension are accepted. Anything that
//! could name a path outside the directory is rejected before touching disk.

use std::path::PathBuf;

use tracing::info;

pub const DIAGRAM_EXTENSIONS: [&str; 2] = [".mmd", ".mermaid"];

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Only .mmd or .mermaid files are allowed")]
    InvalidName,

    #[error("File not found")]
    NotFound,

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl crate::frame::ErrorCode for FileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidName => "E_INVALID_FILENAME",
            Self::NotFound => "E_NOT_FOUND",
            Self::Io(_) => "E_FILE_IO",
        }
    }
}

#[must_use]
pub fn is_diagram_file(name: &str) -> bool {
    DIAGRAM_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn validate_name(name: &str) -> Result<(), FileError> {
    let plain = !name.is_empty()
        && !name.contains(['/', '\\', '\0'])
        && !name.starts_with('.')
        && !name.contains("..");
    if plain && is_diagram_file(name) { Ok(()) } else { Err(FileError::InvalidName) }
}

#[derive(Debug, Clone)]
pub struct DiagramFiles {
    root: PathBuf,
}

impl DiagramFiles {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Diagram filenames in the directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn list(&self) -> Result<Vec<String>, FileError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_diagram_file(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// # Errors
    ///
    /// `InvalidName` for rejected names, `NotFound` when the file is absent.
    pub async fn load(&self, name: &str) -> Result<String, FileError> {
        validate_name(name)?;
        match tokio::fs::read_to_string(self.root.join(name)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound),
            Err(e) => Err(FileError::Io(e)),
        }
    }

    /// # Errors
    ///
    /// `InvalidName` for rejected names, `Io` when the write fails.
    pub async fn save(&self, name: &str, content: &str) -> Result<(), FileError> {
        validate_name(name)?;
        tokio::fs::write(self.root.join(name), content).await?;
        info!(file = name, bytes = content.len(), "diagram file saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
